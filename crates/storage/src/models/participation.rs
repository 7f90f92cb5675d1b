use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::event::EventRecord;
use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Registered,
    Confirmed,
    Attended,
    NotAttended,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "REGISTERED",
            Self::Confirmed => "CONFIRMED",
            Self::Attended => "ATTENDED",
            Self::NotAttended => "NOT_ATTENDED",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "REGISTERED" => Ok(Self::Registered),
            "CONFIRMED" => Ok(Self::Confirmed),
            "ATTENDED" => Ok(Self::Attended),
            "NOT_ATTENDED" => Ok(Self::NotAttended),
            other => Err(StorageError::InvalidData(format!(
                "unknown attendance status '{}'",
                other
            ))),
        }
    }
}

/// A member's registration to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationRecord {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: AttendanceStatus,
}

/// Public identity of a member, carried into ranking rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
}

/// A participation joined with its event and member. Input row of the
/// ranking computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub participation: ParticipationRecord,
    pub member: MemberInfo,
    pub event: EventRecord,
}

impl AttendanceRecord {
    /// Joins the three parts, refusing mismatched keys.
    pub fn join(
        participation: ParticipationRecord,
        member: MemberInfo,
        event: EventRecord,
    ) -> Result<Self, StorageError> {
        if participation.user_id != member.user_id {
            return Err(StorageError::InvalidData(format!(
                "participation user {} does not match member {}",
                participation.user_id, member.user_id
            )));
        }
        if participation.event_id != event.event_id {
            return Err(StorageError::InvalidData(format!(
                "participation event {} does not match event {}",
                participation.event_id, event.event_id
            )));
        }

        Ok(Self {
            participation,
            member,
            event,
        })
    }

    pub fn user_id(&self) -> Uuid {
        self.participation.user_id
    }

    pub fn is_attended(&self) -> bool {
        self.participation.status == AttendanceStatus::Attended
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::StorageError;

/// Category of a foundation event. The category decides how many points an
/// attendance is worth.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Rodada,
    Asamblea,
    Aniversario,
    EventoSocial,
    RallyRegional,
    RallyNacional,
    RallySudamericano,
    RutaIconica,
    RallyInternacional,
    LamaHierro,
    Otro,
}

impl EventType {
    pub const ALL: [EventType; 11] = [
        Self::Rodada,
        Self::Asamblea,
        Self::Aniversario,
        Self::EventoSocial,
        Self::RallyRegional,
        Self::RallyNacional,
        Self::RallySudamericano,
        Self::RutaIconica,
        Self::RallyInternacional,
        Self::LamaHierro,
        Self::Otro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rodada => "RODADA",
            Self::Asamblea => "ASAMBLEA",
            Self::Aniversario => "ANIVERSARIO",
            Self::EventoSocial => "EVENTO_SOCIAL",
            Self::RallyRegional => "RALLY_REGIONAL",
            Self::RallyNacional => "RALLY_NACIONAL",
            Self::RallySudamericano => "RALLY_SUDAMERICANO",
            Self::RutaIconica => "RUTA_ICONICA",
            Self::RallyInternacional => "RALLY_INTERNACIONAL",
            Self::LamaHierro => "LAMA_HIERRO",
            Self::Otro => "OTRO",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == trimmed)
            .ok_or_else(|| StorageError::InvalidEventType(trimmed.to_string()))
    }
}

/// An event as the ranking sees it: when it happened, what kind it was and
/// how far the riders travelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub event_id: Uuid,
    pub name: String,
    pub event_type: EventType,
    pub date: NaiveDate,
    pub kilometers: u32,
}

use std::collections::BTreeMap;

use super::event::EventType;
use crate::error::{Result, StorageError};

pub const STANDARD_TABLE_VERSION: &str = "2024";

/// Points awarded per attended event, by event category.
///
/// Every value is a positive integer. A category missing from the table is a
/// data error: lookups fail instead of falling back to a default score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsTable {
    version: String,
    points: BTreeMap<EventType, u32>,
}

impl PointsTable {
    pub fn standard() -> Self {
        let points = BTreeMap::from([
            (EventType::Rodada, 1),
            (EventType::Asamblea, 1),
            (EventType::Aniversario, 1),
            (EventType::EventoSocial, 2),
            (EventType::RallyRegional, 3),
            (EventType::RallyNacional, 5),
            (EventType::RallySudamericano, 10),
            (EventType::RutaIconica, 10),
            (EventType::RallyInternacional, 15),
            (EventType::LamaHierro, 1),
            (EventType::Otro, 1),
        ]);

        Self {
            version: STANDARD_TABLE_VERSION.to_string(),
            points,
        }
    }

    pub fn from_entries(
        version: impl Into<String>,
        entries: impl IntoIterator<Item = (EventType, u32)>,
    ) -> Result<Self> {
        let mut points = BTreeMap::new();
        for (event_type, value) in entries {
            if value == 0 {
                return Err(StorageError::InvalidPointsTable(format!(
                    "{} must be worth at least one point",
                    event_type
                )));
            }
            if points.insert(event_type, value).is_some() {
                return Err(StorageError::InvalidPointsTable(format!(
                    "{} listed more than once",
                    event_type
                )));
            }
        }

        Ok(Self {
            version: version.into(),
            points,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn points_for(&self, event_type: EventType) -> Result<u32> {
        self.points
            .get(&event_type)
            .copied()
            .ok_or_else(|| StorageError::InvalidEventType(event_type.to_string()))
    }

    /// Entries in category declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (EventType, u32)> + '_ {
        self.points.iter().map(|(t, p)| (*t, *p))
    }
}

impl Default for PointsTable {
    fn default() -> Self {
        Self::standard()
    }
}

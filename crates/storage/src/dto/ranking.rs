use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{EventType, Medal, PointsTable};

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RankingQuery {
    /// Calendar year to rank. Defaults to the current year.
    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: Option<i32>,
}

impl RankingQuery {
    pub fn year_or(&self, current_year: i32) -> i32 {
        self.year.unwrap_or(current_year)
    }
}

/// One row of the yearly ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankingEntry {
    #[serde(rename = "posicion")]
    pub position: u32,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "totalEventos")]
    pub total_events: u32,
    #[serde(rename = "totalPuntos")]
    pub total_points: u64,
    #[serde(rename = "totalKilometros")]
    pub total_kilometers: u64,
    #[serde(rename = "medalla")]
    pub medal: Option<String>,
    #[serde(rename = "colorMedalla")]
    pub medal_color: Option<String>,
    #[serde(rename = "eventos")]
    pub events: Vec<RankingEvent>,
}

/// An attended event and the points it contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankingEvent {
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub event_type: EventType,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "kilometros")]
    pub kilometers: u32,
    #[serde(rename = "puntos")]
    pub points: u32,
}

/// Yearly statistics of a single member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MemberStats {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "anio")]
    pub year: i32,
    #[serde(rename = "totalEventos")]
    pub total_events: u32,
    #[serde(rename = "totalPuntos")]
    pub total_points: u64,
    #[serde(rename = "totalKilometros")]
    pub total_kilometers: u64,
    #[serde(rename = "medalla")]
    pub medal: Option<String>,
    #[serde(rename = "colorMedalla")]
    pub medal_color: Option<String>,
    #[serde(rename = "eventosPorTipo")]
    pub by_type: Vec<TypeBreakdown>,
    #[serde(rename = "eventosRecientes")]
    pub recent_events: Vec<RankingEvent>,
}

impl MemberStats {
    pub fn empty(user_id: Uuid, year: i32) -> Self {
        Self {
            user_id,
            year,
            total_events: 0,
            total_points: 0,
            total_kilometers: 0,
            medal: None,
            medal_color: None,
            by_type: Vec::new(),
            recent_events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TypeBreakdown {
    #[serde(rename = "tipo")]
    pub event_type: EventType,
    #[serde(rename = "cantidad")]
    pub count: u32,
    #[serde(rename = "puntos")]
    pub points: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PointsTableResponse {
    pub version: String,
    #[serde(rename = "puntos")]
    pub points: Vec<PointsTableEntry>,
    #[serde(rename = "medallas")]
    pub medals: Vec<MedalTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PointsTableEntry {
    #[serde(rename = "tipo")]
    pub event_type: EventType,
    #[serde(rename = "puntos")]
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MedalTier {
    #[serde(rename = "medalla")]
    pub name: String,
    pub color: String,
    #[serde(rename = "puntosMinimos")]
    pub min_points: u64,
}

impl From<&PointsTable> for PointsTableResponse {
    fn from(table: &PointsTable) -> Self {
        Self {
            version: table.version().to_string(),
            points: table
                .entries()
                .map(|(event_type, points)| PointsTableEntry { event_type, points })
                .collect(),
            medals: Medal::tiers()
                .map(|medal| MedalTier {
                    name: medal.label().to_string(),
                    color: medal.color().to_string(),
                    min_points: medal.min_points(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_rejects_out_of_range_year() {
        let query = RankingQuery { year: Some(1850) };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_query_accepts_missing_year() {
        let query = RankingQuery { year: None };
        assert!(query.validate().is_ok());
        assert_eq!(query.year_or(2025), 2025);
    }

    #[test]
    fn test_entry_uses_public_field_names() {
        let entry = RankingEntry {
            position: 1,
            user_id: Uuid::nil(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            total_events: 2,
            total_points: 6,
            total_kilometers: 380,
            medal: Some("Bronce".to_string()),
            medal_color: Some("#CD7F32".to_string()),
            events: Vec::new(),
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["posicion"], 1);
        assert_eq!(value["totalPuntos"], 6);
        assert_eq!(value["totalKilometros"], 380);
        assert_eq!(value["medalla"], "Bronce");
        assert_eq!(value["colorMedalla"], "#CD7F32");
        assert!(value["eventos"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_points_table_response_lists_medals_highest_first() {
        let response = PointsTableResponse::from(&PointsTable::standard());
        assert_eq!(response.points.len(), EventType::ALL.len());
        let names: Vec<_> = response.medals.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Rider de Hierro", "Oro", "Plata", "Bronce"]);
    }
}

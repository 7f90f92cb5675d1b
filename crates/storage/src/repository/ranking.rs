use chrono::NaiveDate;
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{AttendanceRecord, EventRecord, MemberInfo, ParticipationRecord};

#[derive(Debug, FromRow)]
struct AttendanceRow {
    user_id: Uuid,
    display_name: String,
    email: String,
    event_id: Uuid,
    event_name: String,
    event_type: String,
    event_date: NaiveDate,
    kilometers: i32,
    attendance_status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StorageError;

    fn try_from(row: AttendanceRow) -> Result<Self> {
        let kilometers = u32::try_from(row.kilometers).map_err(|_| {
            StorageError::InvalidData(format!(
                "event {} has negative kilometers ({})",
                row.event_id, row.kilometers
            ))
        })?;

        AttendanceRecord::join(
            ParticipationRecord {
                user_id: row.user_id,
                event_id: row.event_id,
                status: row.attendance_status.parse()?,
            },
            MemberInfo {
                user_id: row.user_id,
                display_name: row.display_name,
                email: row.email,
            },
            EventRecord {
                event_id: row.event_id,
                name: row.event_name,
                event_type: row.event_type.parse()?,
                date: row.event_date,
                kilometers,
            },
        )
    }
}

pub struct RankingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RankingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attended participations of every member for events dated in `year`.
    pub async fn attendance_for_year(&self, year: i32) -> Result<Vec<AttendanceRecord>> {
        self.fetch_attendance(year, None).await
    }

    /// Attended participations of one member for events dated in `year`.
    pub async fn member_attendance(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> Result<Vec<AttendanceRecord>> {
        self.fetch_attendance(year, Some(user_id)).await
    }

    async fn fetch_attendance(
        &self,
        year: i32,
        user_id: Option<Uuid>,
    ) -> Result<Vec<AttendanceRecord>> {
        let (from, until) = year_bounds(year)?;

        let mut query = QueryBuilder::new(
            r#"
            SELECT
                u.user_id,
                u.display_name,
                u.email,
                e.event_id,
                e.name AS event_name,
                e.event_type,
                e.event_date,
                e.kilometers,
                ep.attendance_status
            FROM event_participants ep
            INNER JOIN users u ON ep.user_id = u.user_id
            INNER JOIN events e ON ep.event_id = e.event_id
            WHERE ep.attendance_status = 'ATTENDED'
            "#,
        );

        query.push(" AND e.event_date >= ");
        query.push_bind(from);
        query.push(" AND e.event_date < ");
        query.push_bind(until);

        if let Some(user_id) = user_id {
            query.push(" AND ep.user_id = ");
            query.push_bind(user_id);
        }

        query.push(" ORDER BY e.event_date, ep.registered_at, u.user_id");

        let rows: Vec<AttendanceRow> = query.build_query_as().fetch_all(self.pool).await?;

        tracing::debug!(year, rows = rows.len(), "Fetched attendance rows");

        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }
}

/// Half-open date range `[Jan 1 of year, Jan 1 of next year)`.
fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let from = NaiveDate::from_ymd_opt(year, 1, 1);
    let until = year
        .checked_add(1)
        .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1));

    from.zip(until)
        .ok_or_else(|| StorageError::InvalidData(format!("year {} is out of range", year)))
}

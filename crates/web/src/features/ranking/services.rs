use sqlx::PgPool;
use storage::{
    dto::ranking::{MemberStats, RankingEntry},
    error::Result,
    models::PointsTable,
    repository::ranking::RankingRepository,
    services::ranking_computation,
};
use uuid::Uuid;

/// Compute the yearly ranking of every member
pub async fn get_ranking(
    pool: &PgPool,
    table: &PointsTable,
    year: i32,
) -> Result<Vec<RankingEntry>> {
    let repo = RankingRepository::new(pool);
    let records = repo.attendance_for_year(year).await?;

    let ranking = ranking_computation::build_ranking(year, &records, table)?;

    tracing::debug!(
        year,
        records = records.len(),
        members = ranking.len(),
        points_table = table.version(),
        "Computed ranking"
    );

    Ok(ranking)
}

/// Compute the yearly statistics of one member
pub async fn get_member_stats(
    pool: &PgPool,
    table: &PointsTable,
    user_id: Uuid,
    year: i32,
    recent_limit: usize,
) -> Result<MemberStats> {
    let repo = RankingRepository::new(pool);
    let records = repo.member_attendance(user_id, year).await?;

    ranking_computation::member_stats(user_id, year, &records, table, recent_limit)
}

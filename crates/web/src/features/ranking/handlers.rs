use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use chrono::Datelike;
use storage::dto::ranking::{MemberStats, PointsTableResponse, RankingEntry, RankingQuery};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::Session;
use crate::state::AppState;

use super::services;

fn resolve_year(query: &RankingQuery) -> Result<i32, WebError> {
    query.validate()?;
    Ok(query.year_or(chrono::Utc::now().year()))
}

#[utoipa::path(
    get,
    path = "/api/rankings",
    params(RankingQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Yearly ranking of members with attended events", body = Vec<RankingEntry>),
        (status = 400, description = "Invalid year"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "rankings"
)]
pub async fn get_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Response, WebError> {
    let year = resolve_year(&query)?;

    let ranking = services::get_ranking(state.db.pool(), &state.points, year).await?;

    Ok(Json(ranking).into_response())
}

#[utoipa::path(
    get,
    path = "/api/rankings/me",
    params(RankingQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Yearly statistics of the authenticated member", body = MemberStats),
        (status = 400, description = "Invalid year"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "rankings"
)]
pub async fn get_my_stats(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<RankingQuery>,
) -> Result<Response, WebError> {
    let year = resolve_year(&query)?;

    let stats = services::get_member_stats(
        state.db.pool(),
        &state.points,
        session.user_id,
        year,
        state.recent_events_limit,
    )
    .await?;

    Ok(Json(stats).into_response())
}

#[utoipa::path(
    get,
    path = "/api/rankings/members/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Member ID"),
        RankingQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Yearly statistics of the member", body = MemberStats),
        (status = 400, description = "Invalid year or member ID"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not staff")
    ),
    tag = "rankings"
)]
pub async fn get_member_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RankingQuery>,
) -> Result<Response, WebError> {
    let year = resolve_year(&query)?;

    let stats = services::get_member_stats(
        state.db.pool(),
        &state.points,
        user_id,
        year,
        state.recent_events_limit,
    )
    .await?;

    Ok(Json(stats).into_response())
}

#[utoipa::path(
    get,
    path = "/api/rankings/points-table",
    responses(
        (status = 200, description = "Points per event type and medal thresholds", body = PointsTableResponse)
    ),
    tag = "rankings"
)]
pub async fn get_points_table(State(state): State<AppState>) -> Json<PointsTableResponse> {
    Json(PointsTableResponse::from(state.points.as_ref()))
}

use axum::{Router, middleware, routing::get};

use super::handlers::{get_member_stats, get_my_stats, get_points_table, get_ranking};
use crate::middleware::auth::{STAFF_ROLES, require_any_role, require_auth};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/members/:user_id", get(get_member_stats))
        .route_layer(middleware::from_fn_with_state(STAFF_ROLES, require_any_role));

    let authenticated = Router::new()
        .route("/", get(get_ranking))
        .route("/me", get(get_my_stats))
        .merge(staff)
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/points-table", get(get_points_table))
        .merge(authenticated)
}

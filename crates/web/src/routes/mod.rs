use axum::{Json, Router, http::HeaderValue, routing::get};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::features::ranking;
use crate::state::AppState;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match allowed_origin.and_then(|origin| origin.parse::<HeaderValue>().ok()) {
        Some(origin) => cors.allow_origin(origin),
        None => {
            if let Some(origin) = allowed_origin {
                tracing::warn!("Ignoring invalid CORS origin '{}', allowing any", origin);
            }
            cors.allow_origin(Any)
        }
    }
}

pub fn router(state: AppState, allowed_origin: Option<&str>) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/rankings", ranking::routes::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origin))
}

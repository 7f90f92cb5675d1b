use std::sync::Arc;

use storage::{Database, models::PointsTable};

use crate::middleware::auth::JwtVerifier;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub points: Arc<PointsTable>,
    pub verifier: Arc<JwtVerifier>,
    pub recent_events_limit: usize,
}

impl AppState {
    pub fn new(
        db: Database,
        points: PointsTable,
        verifier: JwtVerifier,
        recent_events_limit: usize,
    ) -> Self {
        Self {
            db,
            points: Arc::new(points),
            verifier: Arc::new(verifier),
            recent_events_limit,
        }
    }
}

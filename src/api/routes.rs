//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Build the v1 API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/assess", post(handlers::assess))
        .route("/assess/batch", post(handlers::assess_batch))
        .route("/system/health", get(handlers::system_health))
        .with_state(state)
}

//! Route table.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::ServiceState;

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/api/generate/{platform}/{template}", post(handlers::generate))
        .route("/api/generate/{platform}", post(handlers::generate_without_template))
        .route("/api/latest", get(handlers::latest))
        .route("/api/latest-stable", get(handlers::latest_stable))
        .route("/api/versions", get(handlers::versions))
        .route("/api/dialog-flow", get(handlers::dialog_flow))
        .route("/api/config-prepare", get(handlers::config_prepare))
        .route("/api/docs-manifest", get(handlers::docs_manifest))
        .route("/api/docs/{*path}", get(handlers::docs_fragment))
        .with_state(state)
}

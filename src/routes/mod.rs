// HTTP routes: query surface, CSV exports and record ingestion

mod http;
mod ingest;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::stats::StatsService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) stats: Arc<StatsService>,
}

pub fn app(stats: Arc<StatsService>) -> Router {
    let state = AppState { stats };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/v0/health", get(http::health_handler))
        .route("/api/v0/proportion", get(http::proportion_handler))
        .route("/api/v0/static/{category}", get(http::static_handler))
        .route(
            "/api/v0/static/many/{category}",
            get(http::static_many_handler),
        )
        .route("/api/v0/miners", get(http::entities_handler))
        .route("/api/v0/miners/csv", get(http::entities_csv_handler))
        .route("/api/v0/diff/csv", get(http::diff_csv_handler))
        .route("/api/v0/network", get(http::network_handler))
        .route("/api/v0/peer", post(ingest::peer_handler))
        .route("/api/v0/power", post(ingest::power_handler))
        .route("/api/v0/agent", post(ingest::agent_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::commands::CommandExecutor;
use crate::hub::BroadcastHub;
use crate::query::QueryService;

#[derive(Clone)]
pub struct AppState {
    pub(crate) query: Arc<QueryService>,
    pub(crate) commands: Arc<CommandExecutor>,
    pub(crate) hub: Arc<BroadcastHub>,
}

impl AppState {
    pub fn new(
        query: Arc<QueryService>,
        commands: Arc<CommandExecutor>,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self {
            query,
            commands,
            hub,
        }
    }
}

/// REST surface, served on `server.port`.
pub fn api(state: AppState) -> Router {
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/network-data", get(http::network_data)) // GET /api/network-data
        .route("/api/users", get(http::list_users)) // GET /api/users
        .route(
            "/api/users/{username}",
            get(http::user_detail).delete(http::delete_user),
        ) // GET, DELETE /api/users/{username}
        .route("/api/users/{username}/toggle", post(http::toggle_user)) // POST /api/users/{username}/toggle
        .route("/api/logs/all", get(http::device_logs)) // GET /api/logs/all
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Snapshot stream, served on `server.stream_port`.
pub fn stream(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws::ws_snapshots)) // WS /
        .route("/ws", get(ws::ws_snapshots)) // WS /ws
        .with_state(state)
}

// REST handlers and error mapping

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::error::CommandError;

/// Returned with every successful mutation; broadcast state catches up on the next poll.
const EVENTUAL_CONSISTENCY_NOTE: &str = "Change applied on device; it will appear in the next snapshot update";

pub(super) enum ApiError {
    NotFound(&'static str),
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn command_failure(operation: &'static str, username: &str, e: CommandError) -> ApiError {
    match e {
        CommandError::NotFound { .. } => ApiError::NotFound("User not found"),
        other => {
            warn!(operation, username, error = %other, "Command failed");
            ApiError::Internal("Failed to update user")
        }
    }
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/network-data: latest snapshot.
pub(super) async fn network_data(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.query.network_data())
}

/// GET /api/users: users from the latest snapshot.
pub(super) async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.query.list_users())
}

/// GET /api/users/{username}: fresh detail with sessions and history.
pub(super) async fn user_detail(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.query.get_user_detail(&username).await {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => Err(ApiError::NotFound("User not found")),
        Err(e) => {
            warn!(operation = "get_user_detail", username, error = %e, "Query failed");
            Err(ApiError::Internal("Failed to fetch user data"))
        }
    }
}

/// POST /api/users/{username}/toggle: flip the disabled flag.
pub(super) async fn toggle_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let disabled = state
        .commands
        .toggle_user_disabled(&username)
        .await
        .map_err(|e| command_failure("toggle_user_disabled", &username, e))?;
    Ok(Json(json!({
        "success": true,
        "disabled": disabled,
        "message": EVENTUAL_CONSISTENCY_NOTE,
    })))
}

/// DELETE /api/users/{username}
pub(super) async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .commands
        .delete_user(&username)
        .await
        .map_err(|e| command_failure("delete_user", &username, e))?;
    Ok(Json(json!({
        "success": true,
        "message": EVENTUAL_CONSISTENCY_NOTE,
    })))
}

/// GET /api/logs/all: device log, fetched on demand.
pub(super) async fn device_logs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    match state.query.device_logs().await {
        Ok(logs) => Ok(Json(logs)),
        Err(e) => {
            warn!(operation = "device_logs", error = %e, "Query failed");
            Err(ApiError::Internal("Failed to fetch logs"))
        }
    }
}

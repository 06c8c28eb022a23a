use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use thiserror::Error;

/// Error kinds surfaced at the HTTP/WebSocket boundary. `Signaling` and
/// `RTPDecode` are intentionally absent here: per the error-handling design,
/// those are retried or dropped internally and only ever reach
/// `tracing::warn!`, never a caller.
#[derive(Debug, Error)]
pub enum SfuError {
    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("streamer not found: {0} in room {1}")]
    StreamerNotFound(String, String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("upstream collaborator failed: {0}")]
    Upstream(#[source] anyhow::Error),
}

impl IntoResponse for SfuError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            SfuError::RoomNotFound(_) => (StatusCode::NOT_FOUND, "ROOM_NOT_FOUND"),
            SfuError::StreamerNotFound(_, _) => (StatusCode::NOT_FOUND, "STREAMER_NOT_FOUND"),
            SfuError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            SfuError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR"),
        };
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
            "code": code,
        }));
        (status, body).into_response()
    }
}

pub type SfuResult<T> = Result<T, SfuError>;

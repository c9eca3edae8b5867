use super::state::AppState;
use crate::channel::{MethodCall, MethodReply};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ChannelStatusResponse {
    pub busy: bool,
    pub locale: String,
}

/// POST /channels/transcription
/// Invoke a method on the transcription channel
///
/// Always answers 200: success, error and not-implemented are all replies
/// of the channel, not transport failures.
pub async fn invoke_method(
    State(state): State<AppState>,
    Json(call): Json<MethodCall>,
) -> Json<MethodReply> {
    info!("Method call: {}", call.method);

    let reply = state.channel.handle(call).await;

    if let MethodReply::Error { code, message } = &reply {
        info!("Method call failed: {} ({})", message, code);
    }

    Json(reply)
}

/// GET /channels/transcription/status
pub async fn channel_status(State(state): State<AppState>) -> impl IntoResponse {
    let bridge = state.channel.bridge();

    (
        StatusCode::OK,
        Json(ChannelStatusResponse {
            busy: bridge.is_busy(),
            locale: bridge.recognition_config().locale.clone(),
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

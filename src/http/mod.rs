//! HTTP transport for the method channel
//!
//! This module carries method calls from the calling application:
//! - POST /channels/transcription - Invoke a method (one call per request)
//! - GET /channels/transcription/status - Whether a transcription is in flight
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

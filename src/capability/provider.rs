use anyhow::Result;

use super::{PlaybackCapability, RecognitionCapability, RequestId};

/// Allocates fresh capabilities for each request
///
/// Implementations:
/// - NATS: playback streams frames to a remote STT service that recognizes them
/// - Tests: scripted in-memory capabilities
#[async_trait::async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn create_recognizer(&self, request: &RequestId) -> Result<Box<dyn RecognitionCapability>>;

    async fn create_player(&self, request: &RequestId) -> Result<Box<dyn PlaybackCapability>>;
}

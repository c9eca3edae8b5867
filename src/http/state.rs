use crate::channel::TranscriptionChannel;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Method channel served over HTTP
    pub channel: TranscriptionChannel,
}

impl AppState {
    pub fn new(channel: TranscriptionChannel) -> Self {
        Self { channel }
    }
}

//! Host capabilities orchestrated by the bridge
//!
//! The bridge never recognizes or decodes audio itself. It drives two
//! host-supplied capabilities that report progress as events:
//! - Recognition: turns heard audio into text candidates
//! - Playback: decodes and plays the recorded file
//!
//! Each capability is allocated per request through a [`CapabilityProvider`]
//! and owned by a scoped session that releases it exactly once.

mod playback;
mod provider;
mod recognition;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use playback::{PlaybackCapability, PlaybackEvent, PlaybackEvents, PlaybackSession};
pub use provider::CapabilityProvider;
pub use recognition::{
    LanguageModel, RecognitionCapability, RecognitionConfig, RecognitionEvent,
    RecognitionListener, RecognitionSession,
};

/// Tag carried by every capability allocated for one request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(format!("transcription-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Method channel between the calling application and the bridge
//!
//! One method is served:
//! - `transcribeAudio` with argument `audioPath`
//!
//! Every other method name is answered with a not-implemented reply.

mod messages;

use std::sync::Arc;
use tracing::info;

use crate::bridge::TranscriptionBridge;

pub use messages::{MethodCall, MethodReply};

/// Name of the transcription method
pub const TRANSCRIBE_AUDIO: &str = "transcribeAudio";

/// Argument carrying the path of the recording
pub const AUDIO_PATH_ARG: &str = "audioPath";

/// Dispatches method calls to the transcription bridge
#[derive(Clone)]
pub struct TranscriptionChannel {
    bridge: Arc<TranscriptionBridge>,
}

impl TranscriptionChannel {
    pub fn new(bridge: Arc<TranscriptionBridge>) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &TranscriptionBridge {
        &self.bridge
    }

    /// Handle one call and produce its single reply
    pub async fn handle(&self, call: MethodCall) -> MethodReply {
        match call.method.as_str() {
            TRANSCRIBE_AUDIO => {
                let audio_path = call.argument::<String>(AUDIO_PATH_ARG);
                self.bridge.transcribe(audio_path.as_deref()).await.into()
            }
            other => {
                info!("Method not implemented: {}", other);
                MethodReply::NotImplemented
            }
        }
    }
}

pub mod audio;
pub mod bridge;
pub mod capability;
pub mod channel;
pub mod config;
pub mod http;
pub mod nats;

pub use audio::{AudioFile, AudioFrame, FilePlayback, FilePlaybackConfig};
pub use bridge::{Outcome, RecognitionErrorCode, TranscriptionBridge, TranscriptionError};
pub use capability::{
    CapabilityProvider, PlaybackCapability, PlaybackEvent, RecognitionCapability,
    RecognitionConfig, RecognitionEvent, RequestId,
};
pub use channel::{MethodCall, MethodReply, TranscriptionChannel};
pub use config::Config;
pub use http::{create_router, AppState};
pub use nats::{NatsClient, NatsHost};

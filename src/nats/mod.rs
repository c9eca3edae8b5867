pub mod client;
pub mod host;
pub mod messages;
pub mod recognizer;

pub use client::NatsClient;
pub use host::NatsHost;
pub use messages::{AudioFrameMessage, TranscriptMessage};
pub use recognizer::NatsRecognizer;

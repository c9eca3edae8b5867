use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::RequestId;
use crate::bridge::RecognitionErrorCode;

/// Language model hint passed to the recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageModel {
    /// Unconstrained dictation
    FreeForm,
    /// Short query-style phrases
    WebSearch,
}

/// Configuration for one listening session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub language_model: LanguageModel,
    /// BCP 47 locale tag
    pub locale: String,
    /// Maximum number of candidates the recognizer should return
    pub max_results: usize,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language_model: LanguageModel::FreeForm,
            locale: "en-US".to_string(),
            max_results: 1,
        }
    }
}

/// Callbacks emitted by a recognition capability
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    ReadyForSpeech,
    BeginningOfSpeech,
    /// Input level in dB
    RmsChanged(f32),
    BufferReceived(Vec<u8>),
    EndOfSpeech,
    Error(RecognitionErrorCode),
    /// Final candidates, best first
    Results(Vec<String>),
    PartialResults(Vec<String>),
}

pub type RecognitionListener = mpsc::UnboundedSender<RecognitionEvent>;

/// Speech recognition capability supplied by the host
#[async_trait::async_trait]
pub trait RecognitionCapability: Send + Sync {
    /// Register where events are delivered; must be called before listening
    fn register_listener(&mut self, listener: RecognitionListener);

    /// Start listening for speech
    async fn start_listening(&mut self, config: &RecognitionConfig) -> Result<()>;

    /// Release host resources; no events are delivered afterwards
    fn release(&mut self);

    /// Get capability name for logging
    fn name(&self) -> &str;
}

/// Owns one recognizer for the lifetime of a request
///
/// The recognizer is released on the first call to [`RecognitionSession::release`]
/// or on drop, whichever comes first.
pub struct RecognitionSession {
    request: RequestId,
    recognizer: Option<Box<dyn RecognitionCapability>>,
}

impl RecognitionSession {
    pub fn new(request: RequestId, recognizer: Box<dyn RecognitionCapability>) -> Self {
        debug!("{}: recognition session using {}", request, recognizer.name());

        Self {
            request,
            recognizer: Some(recognizer),
        }
    }

    pub fn register_listener(&mut self, listener: RecognitionListener) -> Result<()> {
        match self.recognizer.as_mut() {
            Some(recognizer) => {
                recognizer.register_listener(listener);
                Ok(())
            }
            None => bail!("Recognition session already released"),
        }
    }

    pub async fn start_listening(&mut self, config: &RecognitionConfig) -> Result<()> {
        let Some(recognizer) = self.recognizer.as_mut() else {
            bail!("Recognition session already released");
        };

        info!(
            "{}: listening ({}, max {} result(s))",
            self.request, config.locale, config.max_results
        );
        recognizer.start_listening(config).await
    }

    pub fn release(&mut self) {
        if let Some(mut recognizer) = self.recognizer.take() {
            recognizer.release();
            debug!("{}: recognizer released", self.request);
        }
    }

    pub fn is_released(&self) -> bool {
        self.recognizer.is_none()
    }
}

impl Drop for RecognitionSession {
    fn drop(&mut self) {
        self.release();
    }
}

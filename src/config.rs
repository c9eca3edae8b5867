use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::audio::FilePlaybackConfig;
use crate::capability::{LanguageModel, RecognitionConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub nats: NatsConfig,
    pub recognition: RecognitionSettings,
    pub playback: FilePlaybackConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "transcribe-bridge".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    pub language_model: LanguageModel,
    pub locale: String,
    pub max_results: usize,
    /// Seconds the STT service has to deliver a final transcript after the audio ends
    pub speech_timeout_secs: u64,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        let defaults = RecognitionConfig::default();

        Self {
            language_model: defaults.language_model,
            locale: defaults.locale,
            max_results: defaults.max_results,
            speech_timeout_secs: 10,
        }
    }
}

impl RecognitionSettings {
    pub fn recognition_config(&self) -> RecognitionConfig {
        RecognitionConfig {
            language_model: self.language_model,
            locale: self.locale.clone(),
            max_results: self.max_results,
        }
    }

    pub fn speech_timeout(&self) -> Duration {
        Duration::from_secs(self.speech_timeout_secs)
    }
}

impl Config {
    /// Load from a config file (any format the `config` crate detects from the
    /// extension), then `TRANSCRIBE_BRIDGE__*` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TRANSCRIBE_BRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use tracing::{debug, info};

use crate::audio::AudioFrame;

/// Subject prefix for audio frames; the session id is appended
pub const AUDIO_FRAME_SUBJECT: &str = "audio.frame";

/// Subjects the STT service publishes transcripts on (partial and final)
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Publish audio frame to NATS
    pub async fn publish_audio_frame(
        &self,
        session_id: &str,
        frame: &AudioFrame,
        sequence: u32,
        language: Option<&str>,
    ) -> Result<()> {
        self.publish(
            session_id,
            &frame.to_pcm_bytes(),
            frame.sample_rate,
            frame.channels,
            sequence,
            false,
            language,
        )
        .await
    }

    /// Publish the end-of-audio marker for a session
    pub async fn publish_final_frame(
        &self,
        session_id: &str,
        sample_rate: u32,
        channels: u16,
        sequence: u32,
    ) -> Result<()> {
        self.publish(session_id, &[], sample_rate, channels, sequence, true, None)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn publish(
        &self,
        session_id: &str,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
        sequence: u32,
        is_final: bool,
        language: Option<&str>,
    ) -> Result<()> {
        let subject = format!("{}.{}", AUDIO_FRAME_SUBJECT, session_id);

        let message = super::messages::AudioFrameMessage {
            session_id: session_id.to_string(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            sample_rate,
            channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame: is_final,
            language: language.map(str::to_string),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish audio frame")?;

        debug!(
            "Published audio frame to {} (seq={}, bytes={}, final={})",
            subject,
            sequence,
            pcm_bytes.len(),
            is_final
        );

        Ok(())
    }

    /// Subscribe to transcript messages
    ///
    /// Transcripts for every session arrive on the same subjects; callers
    /// filter by `session_id` in the payload.
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        info!("Subscribing to transcripts on {}", TRANSCRIPT_SUBJECT);

        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT)
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }
}

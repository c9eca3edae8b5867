use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use super::client::NatsClient;
use super::recognizer::NatsRecognizer;
use crate::audio::{AudioFrame, FilePlayback, FilePlaybackConfig};
use crate::capability::{
    CapabilityProvider, PlaybackCapability, RecognitionCapability, RequestId,
};

/// Capability provider backed by a NATS-connected STT service
///
/// For each request, playback frames are published to
/// `audio.frame.<request-id>` and the recognizer listens for transcripts
/// carrying the same id, so the service hears exactly what is played.
pub struct NatsHost {
    client: Arc<NatsClient>,
    playback: FilePlaybackConfig,
    speech_timeout: Duration,
    links: RequestLinks,
}

impl NatsHost {
    pub fn new(
        client: Arc<NatsClient>,
        playback: FilePlaybackConfig,
        speech_timeout: Duration,
    ) -> Self {
        Self {
            client,
            playback,
            speech_timeout,
            links: RequestLinks::default(),
        }
    }
}

#[async_trait::async_trait]
impl CapabilityProvider for NatsHost {
    async fn create_recognizer(&self, request: &RequestId) -> Result<Box<dyn RecognitionCapability>> {
        let (audio_done, locale) = self.links.open(request);

        Ok(Box::new(NatsRecognizer::new(
            Arc::clone(&self.client),
            request.clone(),
            self.speech_timeout,
            audio_done,
            locale,
        )))
    }

    async fn create_player(&self, request: &RequestId) -> Result<Box<dyn PlaybackCapability>> {
        let (frame_tx, frame_rx) = mpsc::channel(100);
        let link = self.links.claim(request);

        tokio::spawn(forward_frames(
            Arc::clone(&self.client),
            request.clone(),
            frame_rx,
            link,
        ));

        Ok(Box::new(FilePlayback::new(self.playback.clone(), frame_tx)))
    }
}

/// Player side of the signals shared with a request's recognizer
struct PlayerLink {
    /// Flipped once the end-of-audio marker is out
    audio_done: watch::Sender<bool>,
    /// Locale the recognizer was started with, empty until then
    locale: watch::Receiver<String>,
}

impl PlayerLink {
    fn detached() -> Self {
        let (audio_done, _) = watch::channel(false);
        let (_, locale) = watch::channel(String::new());
        Self { audio_done, locale }
    }

    fn language(&self) -> Option<String> {
        let locale = self.locale.borrow();
        (!locale.is_empty()).then(|| locale.clone())
    }
}

/// Links opened with a recognizer, waiting for the player of the same request
#[derive(Default)]
struct RequestLinks {
    pending: Mutex<HashMap<RequestId, PlayerLink>>,
}

impl RequestLinks {
    /// Open the link for `request`, returning the recognizer's ends
    fn open(&self, request: &RequestId) -> (watch::Receiver<bool>, watch::Sender<String>) {
        let (done_tx, done_rx) = watch::channel(false);
        let (locale_tx, locale_rx) = watch::channel(String::new());

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.insert(
            request.clone(),
            PlayerLink {
                audio_done: done_tx,
                locale: locale_rx,
            },
        );

        (done_rx, locale_tx)
    }

    /// Take the player's ends for `request`
    fn claim(&self, request: &RequestId) -> PlayerLink {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.remove(request).unwrap_or_else(PlayerLink::detached)
    }
}

/// Publish played frames until the player hangs up, then mark end of audio
async fn forward_frames(
    client: Arc<NatsClient>,
    session: RequestId,
    mut frames: mpsc::Receiver<AudioFrame>,
    link: PlayerLink,
) {
    let mut sequence = 0u32;
    let mut format = (16000, 1);

    while let Some(frame) = frames.recv().await {
        format = (frame.sample_rate, frame.channels);
        let language = link.language();

        if let Err(e) = client
            .publish_audio_frame(session.as_str(), &frame, sequence, language.as_deref())
            .await
        {
            // Keep playing; the recognizer reports missing speech on its own
            error!("{}: failed to publish audio frame: {:#}", session, e);
        }

        sequence += 1;
    }

    if let Err(e) = client
        .publish_final_frame(session.as_str(), format.0, format.1, sequence)
        .await
    {
        error!("{}: failed to publish final frame marker: {:#}", session, e);
    }

    info!("{}: forwarded {} audio frames", session, sequence);
    let _ = link.audio_done.send(true);
}

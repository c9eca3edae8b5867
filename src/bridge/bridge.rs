use super::outcome::{Outcome, RecognitionErrorCode, TranscriptionError};
use super::reply::{AdmissionSlot, PendingReply};
use crate::capability::{
    CapabilityProvider, PlaybackEvent, PlaybackEvents, PlaybackSession, RecognitionConfig,
    RecognitionEvent, RecognitionSession, RequestId,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Accepts transcription requests and drives them to exactly one outcome
pub struct TranscriptionBridge {
    /// Source of per-request recognizers and players
    provider: Arc<dyn CapabilityProvider>,

    /// Recognition settings applied to every request
    recognition: RecognitionConfig,

    /// Admission slot for the single in-flight request
    slot: AdmissionSlot,
}

impl TranscriptionBridge {
    pub fn new(provider: Arc<dyn CapabilityProvider>, recognition: RecognitionConfig) -> Self {
        info!(
            "Transcription bridge ready ({}, {:?})",
            recognition.locale, recognition.language_model
        );

        Self {
            provider,
            recognition,
            slot: AdmissionSlot::new(),
        }
    }

    /// Transcribe the audio file at `audio_path`
    pub async fn transcribe(&self, audio_path: Option<&str>) -> Outcome {
        let reply = self.submit(audio_path)?;

        reply.await.unwrap_or_else(|_| {
            Err(TranscriptionError::Failed(
                "request ended without a result".to_string(),
            ))
        })
    }

    /// Accept a request and return the receiver its outcome is delivered on
    ///
    /// Validation failures and busy rejections are returned immediately,
    /// before any capability is allocated. Everything after admission runs on
    /// a spawned task, so the request completes even if the caller stops waiting.
    pub fn submit(
        &self,
        audio_path: Option<&str>,
    ) -> std::result::Result<oneshot::Receiver<Outcome>, TranscriptionError> {
        let path = match audio_path {
            Some(path) if !path.is_empty() => path,
            _ => {
                warn!("Rejecting transcription request without an audio path");
                return Err(TranscriptionError::InvalidArgument);
            }
        };

        if !Path::new(path).exists() {
            warn!("Audio file not found: {}", path);
            return Err(TranscriptionError::FileNotFound(path.to_string()));
        }

        let id = RequestId::new();
        let Some(guard) = self.slot.try_acquire(&id) else {
            warn!(
                "Rejecting {}: {:?} is still pending",
                path,
                self.slot.current().map(|id| id.to_string())
            );
            return Err(TranscriptionError::Recognition(
                RecognitionErrorCode::RecognizerBusy,
            ));
        };

        info!("{}: transcribing {}", id, path);

        let (reply, rx) = PendingReply::new(id, guard);
        let provider = Arc::clone(&self.provider);
        let config = self.recognition.clone();
        let audio_path = PathBuf::from(path);

        tokio::spawn(async move {
            run_request(provider, config, audio_path, reply).await;
        });

        Ok(rx)
    }

    /// Whether a request is currently in flight
    pub fn is_busy(&self) -> bool {
        self.slot.current().is_some()
    }

    pub fn recognition_config(&self) -> &RecognitionConfig {
        &self.recognition
    }
}

/// Per-request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    Idle,
    AwaitingPlaybackReady,
    Listening,
    Resolved,
}

async fn run_request(
    provider: Arc<dyn CapabilityProvider>,
    config: RecognitionConfig,
    audio_path: PathBuf,
    mut reply: PendingReply,
) {
    let id = reply.id().clone();

    let recognizer = match provider
        .create_recognizer(&id)
        .await
        .context("Failed to create speech recognizer")
    {
        Ok(recognizer) => recognizer,
        Err(e) => {
            error!("{}: {:#}", id, e);
            reply.resolve(Err(TranscriptionError::failed(&e)));
            return;
        }
    };

    let mut recognition = RecognitionSession::new(id.clone(), recognizer);
    let (listener, recognition_events) = mpsc::unbounded_channel();
    if let Err(e) = recognition.register_listener(listener) {
        error!("{}: {:#}", id, e);
        reply.resolve(Err(TranscriptionError::failed(&e)));
        return;
    }

    let mut request = ActiveRequest {
        id,
        audio_path,
        config,
        state: RequestState::Idle,
        reply,
        recognition,
        playback: None,
        playing: false,
    };

    let Some(playback_events) = request.prepare_playback(provider.as_ref()).await else {
        return;
    };

    request.drive(recognition_events, playback_events).await;
}

/// State owned by one accepted request
struct ActiveRequest {
    id: RequestId,
    audio_path: PathBuf,
    config: RecognitionConfig,
    state: RequestState,
    reply: PendingReply,
    recognition: RecognitionSession,
    playback: Option<PlaybackSession>,
    /// Set once the player has been told to start
    playing: bool,
}

impl ActiveRequest {
    /// Allocate the player and ask it to prepare the source
    async fn prepare_playback(
        &mut self,
        provider: &dyn CapabilityProvider,
    ) -> Option<PlaybackEvents> {
        self.state = RequestState::AwaitingPlaybackReady;

        match self.open_player(provider).await {
            Ok((session, events)) => {
                self.playback = Some(session);
                Some(events)
            }
            Err(e) => {
                error!("{}: {:#}", self.id, e);
                self.resolve(Err(TranscriptionError::playback(&e)));
                None
            }
        }
    }

    async fn open_player(
        &self,
        provider: &dyn CapabilityProvider,
    ) -> Result<(PlaybackSession, PlaybackEvents)> {
        let player = provider
            .create_player(&self.id)
            .await
            .context("Failed to create audio player")?;

        let mut session = PlaybackSession::new(self.id.clone(), player);
        session
            .set_source(&self.audio_path)
            .context("Invalid audio source")?;
        let events = session.prepare().await.context("Failed to prepare audio")?;

        Ok((session, events))
    }

    /// Pump capability events until both capabilities are released
    async fn drive(
        &mut self,
        mut recognition_events: mpsc::UnboundedReceiver<RecognitionEvent>,
        mut playback_events: PlaybackEvents,
    ) {
        loop {
            tokio::select! {
                event = recognition_events.recv(), if !self.recognition.is_released() => {
                    match event {
                        Some(event) => self.on_recognition_event(event),
                        None => {
                            warn!("{}: recognizer stopped without a result", self.id);
                            self.resolve(Err(TranscriptionError::Failed(
                                "recognition ended without a result".to_string(),
                            )));
                        }
                    }
                }
                event = playback_events.recv(), if self.playback.is_some() => {
                    match event {
                        Some(PlaybackEvent::Prepared) => self.on_playback_ready().await,
                        Some(PlaybackEvent::Completed) => {
                            info!("{}: playback completed", self.id);
                            self.release_playback();
                        }
                        None => {
                            if !self.playing {
                                self.resolve(Err(TranscriptionError::Playback(
                                    "player closed before it was prepared".to_string(),
                                )));
                            }
                            self.release_playback();
                        }
                    }
                }
                else => break,
            }
        }

        debug!("{}: request finished", self.id);
    }

    /// Listening starts strictly before playback so no speech is missed
    async fn on_playback_ready(&mut self) {
        if self.state != RequestState::AwaitingPlaybackReady {
            debug!("{}: ignoring ready signal in {:?}", self.id, self.state);
            return;
        }

        let listening = self
            .recognition
            .start_listening(&self.config)
            .await
            .context("Failed to start listening");
        if let Err(e) = listening {
            error!("{}: {:#}", self.id, e);
            self.resolve(Err(TranscriptionError::failed(&e)));
            return;
        }
        self.state = RequestState::Listening;

        let Some(playback) = self.playback.as_mut() else {
            return;
        };

        let started = playback.start().await.context("Failed to start playback");
        match started {
            Ok(()) => {
                self.playing = true;
                info!("{}: playback started", self.id);
            }
            Err(e) => {
                error!("{}: {:#}", self.id, e);
                self.resolve(Err(TranscriptionError::playback(&e)));
            }
        }
    }

    fn on_recognition_event(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Results(candidates) => match candidates.into_iter().next() {
                Some(text) => self.resolve(Ok(text)),
                None => self.resolve(Err(TranscriptionError::NoResults)),
            },
            RecognitionEvent::Error(code) => {
                self.resolve(Err(TranscriptionError::Recognition(code)));
            }
            RecognitionEvent::PartialResults(candidates) => {
                debug!("{}: partial {:?}", self.id, candidates.first());
            }
            RecognitionEvent::ReadyForSpeech => debug!("{}: ready for speech", self.id),
            RecognitionEvent::BeginningOfSpeech => debug!("{}: speech started", self.id),
            RecognitionEvent::EndOfSpeech => debug!("{}: speech ended", self.id),
            RecognitionEvent::RmsChanged(_) | RecognitionEvent::BufferReceived(_) => {}
        }
    }

    /// Release the recognizer and deliver the terminal outcome
    ///
    /// A player that never started is released too; a playing one is left to
    /// finish on its own.
    fn resolve(&mut self, outcome: Outcome) {
        if self.state == RequestState::Resolved {
            return;
        }

        match &outcome {
            Ok(text) => info!("{}: transcribed {} characters", self.id, text.len()),
            Err(e) => warn!("{}: {} ({})", self.id, e, e.code()),
        }

        self.state = RequestState::Resolved;
        self.recognition.release();

        if !self.playing {
            self.release_playback();
        }

        self.reply.resolve(outcome);
    }

    fn release_playback(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.release();
        }
    }
}

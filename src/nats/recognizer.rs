use anyhow::{bail, Result};
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::client::NatsClient;
use super::messages::TranscriptMessage;
use crate::bridge::RecognitionErrorCode;
use crate::capability::{
    RecognitionCapability, RecognitionConfig, RecognitionEvent, RecognitionListener, RequestId,
};

/// Recognition capability backed by a remote STT service
///
/// Listens for transcripts tagged with this request's session id. Audio
/// reaches the service separately, from the playback forwarder of the same
/// request. `audio_done` flips once the end-of-audio marker was published;
/// from then on the service has `speech_timeout` to deliver a final transcript.
/// The locale requested in `start_listening` is handed to that forwarder
/// through `locale`.
pub struct NatsRecognizer {
    client: Arc<NatsClient>,
    session_id: RequestId,
    speech_timeout: Duration,
    audio_done: watch::Receiver<bool>,
    locale: watch::Sender<String>,
    listener: Option<RecognitionListener>,
    task: Option<JoinHandle<()>>,
}

impl NatsRecognizer {
    pub fn new(
        client: Arc<NatsClient>,
        session_id: RequestId,
        speech_timeout: Duration,
        audio_done: watch::Receiver<bool>,
        locale: watch::Sender<String>,
    ) -> Self {
        Self {
            client,
            session_id,
            speech_timeout,
            audio_done,
            locale,
            listener: None,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl RecognitionCapability for NatsRecognizer {
    fn register_listener(&mut self, listener: RecognitionListener) {
        self.listener = Some(listener);
    }

    async fn start_listening(&mut self, config: &RecognitionConfig) -> Result<()> {
        if self.task.is_some() {
            bail!("Already listening");
        }
        let Some(listener) = self.listener.clone() else {
            bail!("No recognition listener registered");
        };

        self.locale.send_replace(config.locale.clone());

        let subscriber = self.client.subscribe_transcripts().await?;

        info!("{}: waiting for transcripts ({})", self.session_id, config.locale);

        let session = TranscriptSession {
            session_id: self.session_id.to_string(),
            max_results: config.max_results.max(1),
            speech_timeout: self.speech_timeout,
            audio_done: self.audio_done.clone(),
            listener,
        };

        let payloads = subscriber.map(|msg| msg.payload);
        self.task = Some(tokio::spawn(session.run(payloads)));

        Ok(())
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.listener = None;
    }

    fn name(&self) -> &str {
        "NATS STT"
    }
}

/// Roughly thirty years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Translates transcript messages for one session into recognition events
struct TranscriptSession {
    session_id: String,
    max_results: usize,
    speech_timeout: Duration,
    audio_done: watch::Receiver<bool>,
    listener: RecognitionListener,
}

impl TranscriptSession {
    async fn run<S, P>(mut self, mut payloads: S)
    where
        S: Stream<Item = P> + Unpin,
        P: AsRef<[u8]>,
    {
        self.emit(RecognitionEvent::ReadyForSpeech);

        let mut speaking = false;
        let mut audio_ended = *self.audio_done.borrow();
        let mut deadline = self.deadline();

        loop {
            tokio::select! {
                payload = payloads.next() => {
                    let Some(payload) = payload else {
                        warn!("{}: transcript subscription closed", self.session_id);
                        self.emit(RecognitionEvent::Error(RecognitionErrorCode::Network));
                        break;
                    };

                    let transcript = match serde_json::from_slice::<TranscriptMessage>(payload.as_ref()) {
                        Ok(transcript) => transcript,
                        Err(e) => {
                            warn!("Failed to parse transcript message: {}", e);
                            continue;
                        }
                    };

                    if transcript.session_id != self.session_id {
                        continue;
                    }

                    if !speaking {
                        speaking = true;
                        self.emit(RecognitionEvent::BeginningOfSpeech);
                    }

                    let mut candidates = transcript.candidates();

                    if transcript.partial {
                        debug!("{}: partial transcript: {}", self.session_id, transcript.text);
                        self.emit(RecognitionEvent::PartialResults(candidates));
                        continue;
                    }

                    candidates.truncate(self.max_results);
                    self.emit(RecognitionEvent::EndOfSpeech);
                    self.emit(RecognitionEvent::Results(candidates));
                    break;
                }
                changed = self.audio_done.changed(), if !audio_ended => {
                    if changed.is_err() || *self.audio_done.borrow() {
                        audio_ended = true;
                        deadline = self.deadline();
                    }
                }
                _ = tokio::time::sleep_until(deadline), if audio_ended => {
                    let code = if speaking {
                        RecognitionErrorCode::NetworkTimeout
                    } else {
                        RecognitionErrorCode::SpeechTimeout
                    };
                    warn!("{}: no final transcript within {:?}", self.session_id, self.speech_timeout);
                    self.emit(RecognitionEvent::Error(code));
                    break;
                }
            }
        }
    }

    /// Deadline for a final transcript, pushed far out when the timeout overflows
    fn deadline(&self) -> Instant {
        let now = Instant::now();
        now.checked_add(self.speech_timeout)
            .unwrap_or_else(|| now + FAR_FUTURE)
    }

    fn emit(&self, event: RecognitionEvent) {
        if self.listener.send(event).is_err() {
            debug!("{}: recognition listener gone", self.session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as payload_channel;
    use tokio::sync::mpsc;

    const SESSION: &str = "transcription-test";

    fn transcript(session: &str, text: &str, partial: bool, alternatives: &[&str]) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "session_id": session,
            "text": text,
            "partial": partial,
            "timestamp": "2025-10-27T14:30:05Z",
            "alternatives": alternatives,
        }))
        .unwrap()
    }

    fn session(
        max_results: usize,
        speech_timeout: Duration,
        audio_done: watch::Receiver<bool>,
    ) -> (TranscriptSession, mpsc::UnboundedReceiver<RecognitionEvent>) {
        let (listener, events) = mpsc::unbounded_channel();
        let session = TranscriptSession {
            session_id: SESSION.to_string(),
            max_results,
            speech_timeout,
            audio_done,
            listener,
        };
        (session, events)
    }

    /// Everything the session emitted, up to the point it stopped
    async fn collect(mut events: mpsc::UnboundedReceiver<RecognitionEvent>) -> Vec<RecognitionEvent> {
        let mut seen = Vec::new();
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(event) = events.recv().await {
                seen.push(event);
            }
        })
        .await;
        assert!(drained.is_ok(), "session did not finish: {:?}", seen);
        seen
    }

    #[tokio::test]
    async fn test_final_transcript_for_own_session() {
        let (payload_tx, payloads) = payload_channel::unbounded();
        let (_done_tx, done_rx) = watch::channel(false);
        let (session, events) = session(1, Duration::from_secs(10), done_rx);

        payload_tx.unbounded_send(b"not json".to_vec()).unwrap();
        payload_tx
            .unbounded_send(transcript("transcription-other", "not mine", false, &[]))
            .unwrap();
        payload_tx.unbounded_send(transcript(SESSION, "hel", true, &[])).unwrap();
        payload_tx
            .unbounded_send(transcript(SESSION, "hello world", false, &["hollow world"]))
            .unwrap();

        tokio::spawn(session.run(payloads));

        assert_eq!(
            collect(events).await,
            vec![
                RecognitionEvent::ReadyForSpeech,
                RecognitionEvent::BeginningOfSpeech,
                RecognitionEvent::PartialResults(vec!["hel".to_string()]),
                RecognitionEvent::EndOfSpeech,
                RecognitionEvent::Results(vec!["hello world".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_results_keep_up_to_max_results() {
        let (payload_tx, payloads) = payload_channel::unbounded();
        let (_done_tx, done_rx) = watch::channel(false);
        let (session, events) = session(2, Duration::from_secs(10), done_rx);

        payload_tx
            .unbounded_send(transcript(SESSION, "one", false, &["two", "three"]))
            .unwrap();

        tokio::spawn(session.run(payloads));

        let seen = collect(events).await;
        assert_eq!(
            seen.last(),
            Some(&RecognitionEvent::Results(vec!["one".to_string(), "two".to_string()]))
        );
    }

    #[tokio::test]
    async fn test_silence_after_audio_ends_is_speech_timeout() {
        let (_payload_tx, payloads) = payload_channel::unbounded::<Vec<u8>>();
        let (done_tx, done_rx) = watch::channel(false);
        let (session, events) = session(1, Duration::from_millis(50), done_rx);

        tokio::spawn(session.run(payloads));
        done_tx.send(true).unwrap();

        assert_eq!(
            collect(events).await,
            vec![
                RecognitionEvent::ReadyForSpeech,
                RecognitionEvent::Error(RecognitionErrorCode::SpeechTimeout),
            ]
        );
    }

    #[tokio::test]
    async fn test_stall_after_partial_is_network_timeout() {
        let (payload_tx, payloads) = payload_channel::unbounded();
        let (done_tx, done_rx) = watch::channel(false);
        let (session, events) = session(1, Duration::from_millis(50), done_rx);

        payload_tx.unbounded_send(transcript(SESSION, "hel", true, &[])).unwrap();

        tokio::spawn(session.run(payloads));
        done_tx.send(true).unwrap();

        assert_eq!(
            collect(events).await,
            vec![
                RecognitionEvent::ReadyForSpeech,
                RecognitionEvent::BeginningOfSpeech,
                RecognitionEvent::PartialResults(vec!["hel".to_string()]),
                RecognitionEvent::Error(RecognitionErrorCode::NetworkTimeout),
            ]
        );
    }

    #[tokio::test]
    async fn test_closed_subscription_is_network_error() {
        let (payload_tx, payloads) = payload_channel::unbounded::<Vec<u8>>();
        let (_done_tx, done_rx) = watch::channel(false);
        let (session, events) = session(1, Duration::from_secs(10), done_rx);

        drop(payload_tx);
        tokio::spawn(session.run(payloads));

        assert_eq!(
            collect(events).await,
            vec![
                RecognitionEvent::ReadyForSpeech,
                RecognitionEvent::Error(RecognitionErrorCode::Network),
            ]
        );
    }

    #[tokio::test]
    async fn test_unbounded_speech_timeout_waits_for_transcript() {
        let (payload_tx, payloads) = payload_channel::unbounded();
        let (_done_tx, done_rx) = watch::channel(true);
        let (session, events) = session(1, Duration::MAX, done_rx);

        payload_tx.unbounded_send(transcript(SESSION, "done", false, &[])).unwrap();

        tokio::spawn(session.run(payloads));

        let seen = collect(events).await;
        assert_eq!(seen.last(), Some(&RecognitionEvent::Results(vec!["done".to_string()])));
    }
}

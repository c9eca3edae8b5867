// Scripted in-memory capabilities for bridge tests
//
// Every capability call is appended to a shared trace so tests can check
// call counts and ordering.

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use transcribe_bridge::capability::{
    CapabilityProvider, PlaybackCapability, PlaybackEvent, PlaybackEvents, RecognitionCapability,
    RecognitionConfig, RecognitionEvent, RecognitionListener, RequestId,
};

pub type Trace = Arc<Mutex<Vec<String>>>;

/// How the scripted player behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerScript {
    /// Prepared, then Completed right after start
    Normal,
    /// Prepared, but never completes until the test says so
    Endless,
    FailCreate,
    FailPrepare,
    FailStart,
}

pub struct ScriptedProvider {
    pub trace: Trace,
    recognition_script: Vec<RecognitionEvent>,
    player_script: PlayerScript,
    fail_recognizer: bool,
    close_stream: bool,
    /// Listeners handed to recognizers, for injecting late events
    pub listeners: Arc<Mutex<Vec<RecognitionListener>>>,
    /// Last recognition config each recognizer was started with
    pub configs: Arc<Mutex<Vec<RecognitionConfig>>>,
    /// Event senders of created players
    pub player_events: Arc<Mutex<Vec<mpsc::UnboundedSender<PlaybackEvent>>>>,
}

impl ScriptedProvider {
    /// Recognizer that emits `events` as soon as it starts listening
    pub fn new(events: Vec<RecognitionEvent>) -> Self {
        Self {
            trace: Arc::new(Mutex::new(Vec::new())),
            recognition_script: events,
            player_script: PlayerScript::Normal,
            fail_recognizer: false,
            close_stream: false,
            listeners: Arc::new(Mutex::new(Vec::new())),
            configs: Arc::new(Mutex::new(Vec::new())),
            player_events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Recognizer that never emits on its own
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_player(mut self, script: PlayerScript) -> Self {
        self.player_script = script;
        self
    }

    pub fn failing_recognizer(mut self) -> Self {
        self.fail_recognizer = true;
        self
    }

    /// Recognizer that hangs up its listener once asked to listen
    pub fn closing_recognizer(mut self) -> Self {
        self.close_stream = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.trace.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.as_str() == call)
    }

    /// Send an event through the most recent recognizer's listener
    pub fn emit(&self, event: RecognitionEvent) {
        let listeners = self.listeners.lock().unwrap();
        if let Some(listener) = listeners.last() {
            let _ = listener.send(event);
        }
    }

    /// Finish the most recent player's playback
    pub fn complete_playback(&self) {
        let players = self.player_events.lock().unwrap();
        if let Some(events) = players.last() {
            let _ = events.send(PlaybackEvent::Completed);
        }
    }

    /// Wait until `call` has been recorded `times` times (1s limit)
    pub async fn wait_for(&self, call: &str, times: usize) -> bool {
        for _ in 0..100 {
            if self.count(call) >= times {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn record(&self, call: &str) {
        self.trace.lock().unwrap().push(call.to_string());
    }
}

#[async_trait::async_trait]
impl CapabilityProvider for ScriptedProvider {
    async fn create_recognizer(&self, _request: &RequestId) -> Result<Box<dyn RecognitionCapability>> {
        self.record("create_recognizer");
        if self.fail_recognizer {
            bail!("speech recognition unavailable");
        }

        Ok(Box::new(ScriptedRecognizer {
            trace: Arc::clone(&self.trace),
            script: self.recognition_script.clone(),
            close_stream: self.close_stream,
            listener: None,
            listeners: Arc::clone(&self.listeners),
            configs: Arc::clone(&self.configs),
        }))
    }

    async fn create_player(&self, _request: &RequestId) -> Result<Box<dyn PlaybackCapability>> {
        self.record("create_player");
        if self.player_script == PlayerScript::FailCreate {
            bail!("no audio output");
        }

        Ok(Box::new(ScriptedPlayer {
            trace: Arc::clone(&self.trace),
            script: self.player_script,
            events: None,
            player_events: Arc::clone(&self.player_events),
        }))
    }
}

struct ScriptedRecognizer {
    trace: Trace,
    script: Vec<RecognitionEvent>,
    close_stream: bool,
    listener: Option<RecognitionListener>,
    listeners: Arc<Mutex<Vec<RecognitionListener>>>,
    configs: Arc<Mutex<Vec<RecognitionConfig>>>,
}

impl ScriptedRecognizer {
    fn record(&self, call: &str) {
        self.trace.lock().unwrap().push(call.to_string());
    }
}

#[async_trait::async_trait]
impl RecognitionCapability for ScriptedRecognizer {
    fn register_listener(&mut self, listener: RecognitionListener) {
        self.record("recognizer.register_listener");
        if !self.close_stream {
            self.listeners.lock().unwrap().push(listener.clone());
        }
        self.listener = Some(listener);
    }

    async fn start_listening(&mut self, config: &RecognitionConfig) -> Result<()> {
        self.record("recognizer.start_listening");
        self.configs.lock().unwrap().push(config.clone());

        if self.close_stream {
            self.listener = None;
            return Ok(());
        }

        let Some(listener) = &self.listener else {
            bail!("no listener");
        };
        for event in self.script.drain(..) {
            let _ = listener.send(event);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.record("recognizer.release");
        self.listener = None;
    }

    fn name(&self) -> &str {
        "scripted recognizer"
    }
}

struct ScriptedPlayer {
    trace: Trace,
    script: PlayerScript,
    events: Option<mpsc::UnboundedSender<PlaybackEvent>>,
    player_events: Arc<Mutex<Vec<mpsc::UnboundedSender<PlaybackEvent>>>>,
}

impl ScriptedPlayer {
    fn record(&self, call: &str) {
        self.trace.lock().unwrap().push(call.to_string());
    }
}

#[async_trait::async_trait]
impl PlaybackCapability for ScriptedPlayer {
    fn set_source(&mut self, _path: &Path) -> Result<()> {
        self.record("player.set_source");
        Ok(())
    }

    async fn prepare(&mut self) -> Result<PlaybackEvents> {
        self.record("player.prepare");
        if self.script == PlayerScript::FailPrepare {
            bail!("unsupported format");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(PlaybackEvent::Prepared);
        self.player_events.lock().unwrap().push(tx.clone());
        self.events = Some(tx);
        Ok(rx)
    }

    async fn start(&mut self) -> Result<()> {
        self.record("player.start");
        if self.script == PlayerScript::FailStart {
            bail!("output device busy");
        }

        if self.script == PlayerScript::Normal {
            if let Some(events) = &self.events {
                let _ = events.send(PlaybackEvent::Completed);
            }
        }
        Ok(())
    }

    fn release(&mut self) {
        self.record("player.release");
        self.events = None;
    }

    fn name(&self) -> &str {
        "scripted player"
    }
}

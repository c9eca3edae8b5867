use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::file::AudioFile;
use super::frame::AudioFrame;
use crate::capability::{PlaybackCapability, PlaybackEvent, PlaybackEvents};

/// Configuration for file playback
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilePlaybackConfig {
    /// Duration of each emitted frame in milliseconds
    pub frame_duration_ms: u64,
    /// Output sample rate (16kHz for Whisper)
    pub sample_rate: u32,
    /// Output channel count (1 = mono)
    pub channels: u16,
    /// Pace frames in real time; disable to stream as fast as the bus accepts
    pub realtime: bool,
}

impl Default for FilePlaybackConfig {
    fn default() -> Self {
        Self {
            frame_duration_ms: 100,
            sample_rate: 16000,
            channels: 1,
            realtime: true,
        }
    }
}

/// Plays a WAV file onto an audio bus
///
/// Frames are converted to the configured format and sent on `output`, paced
/// at the speed they would be heard. `Completed` follows the last frame.
pub struct FilePlayback {
    config: FilePlaybackConfig,
    output: Option<mpsc::Sender<AudioFrame>>,
    source: Option<PathBuf>,
    prepared: Option<AudioFile>,
    events: Option<mpsc::UnboundedSender<PlaybackEvent>>,
    task: Option<JoinHandle<()>>,
}

impl FilePlayback {
    pub fn new(config: FilePlaybackConfig, output: mpsc::Sender<AudioFrame>) -> Self {
        Self {
            config,
            output: Some(output),
            source: None,
            prepared: None,
            events: None,
            task: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

#[async_trait::async_trait]
impl PlaybackCapability for FilePlayback {
    fn set_source(&mut self, path: &Path) -> Result<()> {
        if self.task.is_some() {
            bail!("Cannot change source after playback started");
        }
        if !path.is_file() {
            bail!("Not a file: {}", path.display());
        }

        self.source = Some(path.to_path_buf());
        self.prepared = None;
        Ok(())
    }

    async fn prepare(&mut self) -> Result<PlaybackEvents> {
        let Some(source) = self.source.clone() else {
            bail!("No source set");
        };

        let audio = tokio::task::spawn_blocking(move || AudioFile::open(source))
            .await
            .context("Audio decoder panicked")??;

        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is returned below, so this send cannot fail
        let _ = tx.send(PlaybackEvent::Prepared);

        self.prepared = Some(audio);
        self.events = Some(tx);

        Ok(rx)
    }

    async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            bail!("Already playing");
        }
        let Some(audio) = self.prepared.take() else {
            bail!("Playback not prepared");
        };
        let Some(output) = self.output.clone() else {
            bail!("Player released");
        };
        let Some(events) = self.events.clone() else {
            bail!("Playback not prepared");
        };

        let config = self.config.clone();
        info!(
            "Playing {} ({:.1}s) at {}Hz/{}ch",
            audio.path, audio.duration_seconds, config.sample_rate, config.channels
        );

        self.task = Some(tokio::spawn(async move {
            let frames = audio.frames(config.frame_duration_ms);
            let mut ticker =
                tokio::time::interval(Duration::from_millis(config.frame_duration_ms.max(1)));
            let mut sent = 0usize;

            for frame in frames {
                if config.realtime {
                    ticker.tick().await;
                }

                let frame = frame.convert(config.sample_rate, config.channels);
                if output.send(frame).await.is_err() {
                    warn!("Audio bus closed, stopping playback");
                    break;
                }
                sent += 1;
            }

            debug!("Playback finished after {} frames", sent);
            let _ = events.send(PlaybackEvent::Completed);
        }));

        Ok(())
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                task.abort();
            }
        }
        self.output = None;
        self.events = None;
        self.prepared = None;
    }

    fn name(&self) -> &str {
        "WAV file playback"
    }
}

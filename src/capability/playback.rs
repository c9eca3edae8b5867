use anyhow::{bail, Result};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

use super::RequestId;

/// Callbacks emitted by a playback capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Source decoded and ready to start
    Prepared,
    /// Playback reached the end of the source
    Completed,
}

pub type PlaybackEvents = mpsc::UnboundedReceiver<PlaybackEvent>;

/// Audio playback capability supplied by the host
#[async_trait::async_trait]
pub trait PlaybackCapability: Send + Sync {
    /// Set the file to play
    fn set_source(&mut self, path: &Path) -> Result<()>;

    /// Prepare the source
    ///
    /// Returns the event stream; `Prepared` is delivered on it once playback
    /// can start.
    async fn prepare(&mut self) -> Result<PlaybackEvents>;

    /// Start playing; `Completed` follows on the event stream
    async fn start(&mut self) -> Result<()>;

    /// Release host resources
    fn release(&mut self);

    /// Get capability name for logging
    fn name(&self) -> &str;
}

/// Owns one player for the lifetime of its playback
///
/// Independent of the recognition session: it is released on its own
/// completion, or on drop.
pub struct PlaybackSession {
    request: RequestId,
    player: Option<Box<dyn PlaybackCapability>>,
}

impl PlaybackSession {
    pub fn new(request: RequestId, player: Box<dyn PlaybackCapability>) -> Self {
        debug!("{}: playback session using {}", request, player.name());

        Self {
            request,
            player: Some(player),
        }
    }

    pub fn set_source(&mut self, path: &Path) -> Result<()> {
        match self.player.as_mut() {
            Some(player) => player.set_source(path),
            None => bail!("Playback session already released"),
        }
    }

    pub async fn prepare(&mut self) -> Result<PlaybackEvents> {
        match self.player.as_mut() {
            Some(player) => player.prepare().await,
            None => bail!("Playback session already released"),
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        match self.player.as_mut() {
            Some(player) => player.start().await,
            None => bail!("Playback session already released"),
        }
    }

    pub fn release(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.release();
            debug!("{}: player released", self.request);
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.release();
    }
}

use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::outcome::{Outcome, TranscriptionError};
use crate::capability::RequestId;

/// Single slot admitting at most one in-flight request
#[derive(Debug, Clone, Default)]
pub struct AdmissionSlot {
    current: Arc<Mutex<Option<RequestId>>>,
}

impl AdmissionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `id`, or `None` if another request holds it
    pub fn try_acquire(&self, id: &RequestId) -> Option<SlotGuard> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if current.is_some() {
            return None;
        }
        *current = Some(id.clone());

        Some(SlotGuard {
            slot: self.clone(),
            id: id.clone(),
        })
    }

    /// Request currently holding the slot
    pub fn current(&self) -> Option<RequestId> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Frees the admission slot when dropped
#[derive(Debug)]
pub struct SlotGuard {
    slot: AdmissionSlot,
    id: RequestId,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut current = self.slot.current.lock().unwrap_or_else(|e| e.into_inner());
        if current.as_ref() == Some(&self.id) {
            *current = None;
        }
    }
}

/// Write-once response sink for one request
///
/// The first call to [`PendingReply::resolve`] frees the admission slot and
/// delivers the outcome. Every later call is a no-op.
#[derive(Debug)]
pub struct PendingReply {
    id: RequestId,
    sender: Option<oneshot::Sender<Outcome>>,
    slot: Option<SlotGuard>,
}

impl PendingReply {
    pub fn new(id: RequestId, slot: SlotGuard) -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();

        (
            Self {
                id,
                sender: Some(tx),
                slot: Some(slot),
            },
            rx,
        )
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn is_resolved(&self) -> bool {
        self.sender.is_none()
    }

    /// Deliver `outcome`; returns false if a reply was already delivered
    pub fn resolve(&mut self, outcome: Outcome) -> bool {
        let Some(sender) = self.sender.take() else {
            debug!("{}: already resolved, ignoring late outcome", self.id);
            return false;
        };

        // Free the slot first so a caller reacting to the reply can submit again
        self.slot.take();

        if sender.send(outcome).is_err() {
            warn!("{}: caller stopped waiting before the reply", self.id);
        }

        true
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        if !self.is_resolved() {
            warn!("{}: request dropped without an outcome", self.id);
            self.resolve(Err(TranscriptionError::Failed(
                "request ended without a result".to_string(),
            )));
        }
    }
}

//! Transcription bridge
//!
//! This module provides the `TranscriptionBridge` that turns one method call into
//! one transcription:
//! - Input validation and single-request admission
//! - Recognition and playback orchestration (listening starts before playback)
//! - Exactly-once reply delivery and capability cleanup

mod bridge;
mod outcome;
mod reply;

pub use bridge::TranscriptionBridge;
pub use outcome::{Outcome, RecognitionErrorCode, TranscriptionError};
pub use reply::{AdmissionSlot, PendingReply, SlotGuard};

//! Side-effect hooks fired at gameplay transitions (sounds, animations).

use std::io::Write;

use tracing::{debug, instrument};

/// Fire-and-forget hooks invoked by the session.
///
/// The session never reads anything back from these calls.
pub trait Feedback: Send {
    /// A prime was accepted into the selection.
    fn on_select(&mut self, _prime: u32) {}

    /// A target was solved.
    fn on_match(&mut self, _target: u32) {}

    /// A prime was removed from the selection.
    fn on_undo(&mut self, _prime: u32) {}
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentFeedback;

impl Feedback for SilentFeedback {}

/// Logs each hook at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    #[instrument(skip(self))]
    fn on_select(&mut self, prime: u32) {
        debug!(prime, "select");
    }

    #[instrument(skip(self))]
    fn on_match(&mut self, target: u32) {
        debug!(target, "match");
    }

    #[instrument(skip(self))]
    fn on_undo(&mut self, prime: u32) {
        debug!(prime, "undo");
    }
}

/// Rings the terminal bell when a target is solved.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellFeedback;

impl Feedback for BellFeedback {
    fn on_match(&mut self, target: u32) {
        debug!(target, "match bell");
        let mut out = std::io::stdout();
        // Bell failures are cosmetic.
        let _ = out.write_all(b"\x07").and_then(|()| out.flush());
    }
}

//! Progress reporting for bulk dispatch runs.

use tokio::sync::mpsc;

use crate::outcome::DispatchOutcome;

/// Receives cumulative progress after every resolved recipient.
///
/// Called synchronously from the dispatch loop with the number of
/// recipients processed so far and every outcome recorded so far.
/// Implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, processed: usize, outcomes: &[DispatchOutcome]);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, &[DispatchOutcome]) + Send + Sync,
{
    fn on_progress(&self, processed: usize, outcomes: &[DispatchOutcome]) {
        self(processed, outcomes)
    }
}

/// Snapshot of a dispatch run at one progress step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchProgress {
    pub processed: usize,
    pub outcomes: Vec<DispatchOutcome>,
}

/// Forwards progress snapshots over an unbounded channel, for callers
/// that prefer consuming a stream to supplying a callback.
pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<DispatchProgress>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<DispatchProgress>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DispatchProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn on_progress(&self, processed: usize, outcomes: &[DispatchOutcome]) {
        // A dropped receiver only means nobody is watching any more.
        let _ = self.tx.send(DispatchProgress {
            processed,
            outcomes: outcomes.to_vec(),
        });
    }
}

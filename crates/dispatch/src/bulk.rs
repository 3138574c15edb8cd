//! Sequential, throttled bulk message dispatch.
//!
//! [`BulkDispatcher::dispatch`] walks a recipient list in order, sends
//! the same message to each one through a [`MessageSender`], and pauses
//! for [`DispatchConfig::send_delay`] between consecutive recipients so
//! the gateway's own rate limits are respected. Sends are never issued
//! concurrently.
//!
//! Cancellation is cooperative: the caller cancels the
//! [`CancellationToken`] it passed in, and the loop observes it at the
//! top of the next iteration. An in-flight send is never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use taguato_core::error::CoreError;
use taguato_core::limits::{MAX_RECIPIENTS, SEND_DELAY};
use taguato_core::recipients::validate_recipients;
use taguato_core::transport::MessageSender;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::outcome::{DispatchOutcome, DispatchSummary};
use crate::progress::ProgressSink;

/// Tunable parameters for a dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Pause between two consecutive recipients.
    pub send_delay: Duration,
    /// Largest recipient list accepted by one run.
    pub max_recipients: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_delay: SEND_DELAY,
            max_recipients: MAX_RECIPIENTS,
        }
    }
}

/// Errors returned by [`BulkDispatcher::dispatch`].
///
/// Individual send failures are never errors; they are recorded as
/// `failed` outcomes.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The recipient list is empty or larger than the configured cap.
    #[error(transparent)]
    InvalidJob(#[from] CoreError),

    /// Another run is still in progress on this dispatcher.
    #[error("a dispatch is already running on this dispatcher")]
    Busy,
}

/// Sends one message to many recipients, one at a time.
///
/// A dispatcher is reusable across runs but not reentrant: a second
/// [`dispatch`](Self::dispatch) call while one is running fails with
/// [`DispatchError::Busy`].
pub struct BulkDispatcher<S> {
    sender: S,
    config: DispatchConfig,
    running: AtomicBool,
}

impl<S: MessageSender> BulkDispatcher<S> {
    /// Create a dispatcher with the default 500 ms throttle and 500-recipient cap.
    pub fn new(sender: S) -> Self {
        Self::with_config(sender, DispatchConfig::default())
    }

    pub fn with_config(sender: S, config: DispatchConfig) -> Self {
        Self {
            sender,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Send `message` to every recipient through the `target` instance.
    ///
    /// Resolves once every recipient has a terminal outcome. The
    /// returned list has exactly one entry per input recipient, in input
    /// order. `progress` is called after every resolved recipient, and
    /// once for the whole batch of recipients left over when `cancel`
    /// is observed.
    pub async fn dispatch(
        &self,
        target: &str,
        recipients: &[String],
        message: &str,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<DispatchOutcome>, DispatchError> {
        validate_recipients(recipients, self.config.max_recipients)?;
        let _guard = RunGuard::acquire(&self.running).ok_or(DispatchError::Busy)?;

        let job_id = Uuid::new_v4();
        let total = recipients.len();
        let mut outcomes = Vec::with_capacity(total);

        tracing::info!(
            %job_id,
            instance = target,
            total,
            delay_ms = self.config.send_delay.as_millis() as u64,
            "Bulk dispatch started",
        );

        for (index, raw) in recipients.iter().enumerate() {
            if cancel.is_cancelled() {
                outcomes.extend(
                    recipients[index..]
                        .iter()
                        .map(|remaining| DispatchOutcome::cancelled(remaining.trim())),
                );
                progress.on_progress(total, &outcomes);
                tracing::info!(
                    %job_id,
                    instance = target,
                    cancelled = total - index,
                    "Bulk dispatch cancelled",
                );
                break;
            }

            let recipient = raw.trim();
            let outcome = if recipient.is_empty() {
                DispatchOutcome::skipped(recipient)
            } else {
                match self.sender.send_text(target, recipient, message).await {
                    Ok(()) => {
                        tracing::debug!(%job_id, index, recipient, "Message sent");
                        DispatchOutcome::sent(recipient)
                    }
                    Err(e) => {
                        tracing::warn!(
                            %job_id,
                            index,
                            recipient,
                            error = %e,
                            "Message send failed",
                        );
                        DispatchOutcome::failed(recipient, e.display_message())
                    }
                }
            };
            outcomes.push(outcome);
            progress.on_progress(index + 1, &outcomes);

            if index + 1 < total {
                // Throttle, but wake early on cancel so the next
                // iteration can mark the rest without waiting.
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.config.send_delay) => {}
                }
            }
        }

        let summary = DispatchSummary::from_outcomes(&outcomes);
        tracing::info!(
            %job_id,
            instance = target,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "Bulk dispatch finished",
        );

        Ok(outcomes)
    }
}

/// Marks a dispatcher as running for the lifetime of one run.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

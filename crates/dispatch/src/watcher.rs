//! Bounded polling of an instance's pairing state.
//!
//! [`ConnectionWatcher::start_watch`] spawns one polling task per
//! session. The task ticks every [`WatchConfig::interval`], asks the
//! [`StatusProbe`] for the instance's state, and finishes when the
//! instance reports `open` (the terminal callback fires), when the
//! attempt budget is spent, or when the session is stopped.
//!
//! A watcher owns at most one live session. Starting a new watch, or
//! calling [`ConnectionWatcher::stop_watch`], retires the previous
//! session's task before returning, so no orphaned tick can fire
//! against a retired target.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use taguato_core::limits::{MAX_POLL_ATTEMPTS, POLL_INTERVAL};
use taguato_core::transport::StatusProbe;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Shortest accepted poll interval. Zero-length periods are raised to this.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Tunable parameters for a watcher.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Time between two polls. The first poll happens one interval after start.
    pub interval: Duration,
    /// Number of polls before the session expires.
    pub max_attempts: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

/// Lifecycle of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No session has been started.
    Idle,
    /// Polling; `attempt` polls have been issued so far.
    Polling { attempt: u32 },
    /// A poll observed the paired state and the terminal callback fired.
    Paired,
    /// The attempt budget ran out without pairing.
    Expired,
    /// The session was stopped or replaced.
    Stopped,
}

impl WatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paired | Self::Expired | Self::Stopped)
    }
}

/// Caller-side view of one watch session.
///
/// Dropping the handle does not stop the session.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    target: String,
    state: watch::Receiver<WatchState>,
}

impl WatchHandle {
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current state of the session.
    pub fn state(&self) -> WatchState {
        *self.state.borrow()
    }

    /// Wait until the session reaches a terminal state.
    pub async fn finished(&mut self) -> WatchState {
        loop {
            let current = *self.state.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return *self.state.borrow();
            }
        }
    }
}

/// Polls one instance at a time until it pairs.
pub struct ConnectionWatcher<P> {
    probe: Arc<P>,
    config: WatchConfig,
    session: Mutex<Option<ActiveSession>>,
}

/// Bookkeeping for the live session.
struct ActiveSession {
    target: String,
    cancel: CancellationToken,
    state: Arc<watch::Sender<WatchState>>,
    task: JoinHandle<()>,
}

impl ActiveSession {
    /// Stop the polling task and mark the session stopped, unless it
    /// already finished on its own.
    fn retire(self) {
        self.cancel.cancel();
        self.task.abort();
        let stopped = finish(&self.state, WatchState::Stopped);
        if stopped {
            tracing::info!(instance = %self.target, "Connection watch stopped");
        }
    }
}

impl<P: StatusProbe + 'static> ConnectionWatcher<P> {
    /// Create a watcher polling every 3 s, up to 40 times.
    pub fn new(probe: P) -> Self {
        Self::with_config(probe, WatchConfig::default())
    }

    /// Create a watcher with explicit limits. An interval below 1 ms is
    /// raised to 1 ms.
    pub fn with_config(probe: P, mut config: WatchConfig) -> Self {
        config.interval = config.interval.max(MIN_INTERVAL);
        Self {
            probe: Arc::new(probe),
            config,
            session: Mutex::new(None),
        }
    }

    /// Start watching `target`, retiring any session already running.
    ///
    /// `on_terminal` runs at most once, after the session has been marked
    /// paired. It never runs for an expired or stopped session. Must be
    /// called from within a Tokio runtime.
    pub fn start_watch<F>(&self, target: impl Into<String>, on_terminal: F) -> WatchHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let target = target.into();
        let mut session = self.lock_session();
        if let Some(previous) = session.take() {
            previous.retire();
        }

        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(WatchState::Polling { attempt: 0 });
        let state_tx = Arc::new(state_tx);

        tracing::info!(
            instance = %target,
            interval_ms = self.config.interval.as_millis() as u64,
            max_attempts = self.config.max_attempts,
            "Connection watch started",
        );

        let task = tokio::spawn(run_watch(
            Arc::clone(&self.probe),
            target.clone(),
            self.config.clone(),
            cancel.clone(),
            Arc::clone(&state_tx),
            on_terminal,
        ));

        *session = Some(ActiveSession {
            target: target.clone(),
            cancel,
            state: state_tx,
            task,
        });

        WatchHandle {
            target,
            state: state_rx,
        }
    }
}

impl<P> ConnectionWatcher<P> {
    /// Stop the current session, if any. Safe to call repeatedly and
    /// after the session finished on its own.
    pub fn stop_watch(&self) {
        if let Some(previous) = self.lock_session().take() {
            previous.retire();
        }
    }

    /// Whether a session is currently polling.
    pub fn is_active(&self) -> bool {
        self.lock_session()
            .as_ref()
            .is_some_and(|session| !session.state.borrow().is_terminal())
    }

    /// Target of the current session, kept after it finishes on its own
    /// and cleared by [`stop_watch`](Self::stop_watch).
    pub fn current_target(&self) -> Option<String> {
        self.lock_session()
            .as_ref()
            .map(|session| session.target.clone())
    }

    /// State of the current session, or [`WatchState::Idle`] when there
    /// is none.
    pub fn state(&self) -> WatchState {
        self.lock_session()
            .as_ref()
            .map_or(WatchState::Idle, |session| *session.state.borrow())
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P> Drop for ConnectionWatcher<P> {
    fn drop(&mut self) {
        self.stop_watch();
    }
}

/// Move a session to a terminal state unless it is already terminal.
/// Returns whether the state changed.
fn finish(state: &watch::Sender<WatchState>, end: WatchState) -> bool {
    state.send_if_modified(|current| {
        if current.is_terminal() {
            false
        } else {
            *current = end;
            true
        }
    })
}

/// Marks the session stopped when the polling task ends without
/// reaching a terminal state, including by panic or abort.
struct StopOnDrop(Arc<watch::Sender<WatchState>>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        finish(&self.0, WatchState::Stopped);
    }
}

/// Polling loop for one session.
async fn run_watch<P, F>(
    probe: Arc<P>,
    target: String,
    config: WatchConfig,
    cancel: CancellationToken,
    state: Arc<watch::Sender<WatchState>>,
    on_terminal: F,
) where
    P: StatusProbe + ?Sized,
    F: FnOnce(),
{
    let _stop_on_drop = StopOnDrop(Arc::clone(&state));
    let first_tick = tokio::time::Instant::now() + config.interval;
    let mut ticker = tokio::time::interval_at(first_tick, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempt = 0u32;

    let end = loop {
        if attempt >= config.max_attempts {
            break WatchState::Expired;
        }

        let ticked = tokio::select! {
            _ = cancel.cancelled() => false,
            _ = ticker.tick() => true,
        };
        if !ticked {
            break WatchState::Stopped;
        }

        attempt += 1;
        state.send_if_modified(|current| match current {
            WatchState::Polling { .. } => {
                *current = WatchState::Polling { attempt };
                true
            }
            _ => false,
        });

        let polled = tokio::select! {
            _ = cancel.cancelled() => None,
            result = probe.connection_state(&target) => Some(result),
        };
        match polled {
            None => break WatchState::Stopped,
            Some(Ok(current)) if current.is_paired() => break WatchState::Paired,
            Some(Ok(current)) => {
                tracing::debug!(
                    instance = %target,
                    attempt,
                    state = %current,
                    "Instance not paired yet",
                );
            }
            Some(Err(e)) => {
                tracing::debug!(
                    instance = %target,
                    attempt,
                    error = %e,
                    "Status poll failed, will retry",
                );
            }
        }
    };

    match end {
        // A stop racing this point wins if it already wrote `Stopped`.
        WatchState::Paired if !cancel.is_cancelled() => {
            if finish(&state, WatchState::Paired) {
                tracing::info!(instance = %target, attempt, "Instance paired");
                on_terminal();
            }
        }
        WatchState::Expired => {
            tracing::info!(instance = %target, attempt, "Connection watch expired without pairing");
            finish(&state, WatchState::Expired);
        }
        _ => {
            finish(&state, WatchState::Stopped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_polls_for_two_minutes() {
        let config = WatchConfig::default();
        assert_eq!(config.interval, Duration::from_secs(3));
        assert_eq!(config.max_attempts, 40);
        assert_eq!(config.interval * config.max_attempts, Duration::from_secs(120));
    }

    #[test]
    fn terminal_states() {
        assert!(!WatchState::Idle.is_terminal());
        assert!(!WatchState::Polling { attempt: 3 }.is_terminal());
        assert!(WatchState::Paired.is_terminal());
        assert!(WatchState::Expired.is_terminal());
        assert!(WatchState::Stopped.is_terminal());
    }

    #[test]
    fn stop_on_drop_marks_an_unfinished_session_stopped() {
        let (tx, rx) = watch::channel(WatchState::Polling { attempt: 2 });
        drop(StopOnDrop(Arc::new(tx)));
        assert_eq!(*rx.borrow(), WatchState::Stopped);
    }

    #[test]
    fn finish_does_not_overwrite_a_terminal_state() {
        let (tx, rx) = watch::channel(WatchState::Polling { attempt: 1 });
        assert!(finish(&tx, WatchState::Paired));
        assert!(!finish(&tx, WatchState::Stopped));
        assert_eq!(*rx.borrow(), WatchState::Paired);
    }
}

//! In-memory collaborators shared by the dispatch integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taguato_core::connection::ConnectionState;
use taguato_core::transport::{MessageSender, StatusProbe, TransportError};
use taguato_dispatch::DispatchOutcome;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Convert string literals into the owned recipient list `dispatch` takes.
pub fn recipients(list: &[&str]) -> Vec<String> {
    list.iter().map(|r| r.to_string()).collect()
}

// ---------------------------------------------------------------------------
// FakeSender
// ---------------------------------------------------------------------------

/// Records every send and answers from a per-recipient failure table.
#[derive(Default)]
pub struct FakeSender {
    calls: Mutex<Vec<(String, String, String)>>,
    failures: HashMap<String, String>,
    latency: Duration,
    cancel_after: Option<(String, CancellationToken)>,
}

impl FakeSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail sends to `recipient` with `message`.
    pub fn failing(mut self, recipient: &str, message: &str) -> Self {
        self.failures
            .insert(recipient.to_string(), message.to_string());
        self
    }

    /// Make every send take `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Cancel `token` while the send to `recipient` is in flight.
    pub fn cancelling_on(mut self, recipient: &str, token: CancellationToken) -> Self {
        self.cancel_after = Some((recipient.to_string(), token));
        self
    }

    /// Recipients sent to, in call order.
    pub fn sent_to(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, recipient, _)| recipient.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for FakeSender {
    async fn send_text(
        &self,
        instance: &str,
        recipient: &str,
        message: &str,
    ) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push((
            instance.to_string(),
            recipient.to_string(),
            message.to_string(),
        ));

        if let Some((trigger, token)) = &self.cancel_after {
            if trigger == recipient {
                token.cancel();
            }
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.failures.get(recipient) {
            Some(message) => Err(TransportError::with_status(400, message.clone())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressLog
// ---------------------------------------------------------------------------

/// Progress sink recording every `(processed, outcomes)` call.
#[derive(Default)]
pub struct ProgressLog {
    calls: Mutex<Vec<(usize, Vec<DispatchOutcome>)>>,
}

impl ProgressLog {
    pub fn record(&self, processed: usize, outcomes: &[DispatchOutcome]) {
        self.calls
            .lock()
            .unwrap()
            .push((processed, outcomes.to_vec()));
    }

    pub fn calls(&self) -> Vec<(usize, Vec<DispatchOutcome>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn processed_counts(&self) -> Vec<usize> {
        self.calls().into_iter().map(|(processed, _)| processed).collect()
    }
}

impl taguato_dispatch::ProgressSink for ProgressLog {
    fn on_progress(&self, processed: usize, outcomes: &[DispatchOutcome]) {
        self.record(processed, outcomes);
    }
}

// ---------------------------------------------------------------------------
// ScriptedProbe
// ---------------------------------------------------------------------------

/// Status probe answering from a script, then a fallback state.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<Result<ConnectionState, TransportError>>>,
    fallback: ConnectionState,
    latency: Duration,
    polls: Mutex<Vec<(String, Instant)>>,
    total: AtomicUsize,
}

impl ScriptedProbe {
    /// A probe that reports `connecting` forever.
    pub fn never_pairs() -> Self {
        Self::scripted(Vec::new())
    }

    /// A probe that replays `script`, then reports `connecting`.
    pub fn scripted(script: Vec<Result<ConnectionState, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: ConnectionState::Connecting,
            latency: Duration::ZERO,
            polls: Mutex::new(Vec::new()),
            total: AtomicUsize::new(0),
        }
    }

    /// A probe that reports `connecting` `before` times, then `open`.
    pub fn pairs_after(before: usize) -> Self {
        let mut script: Vec<_> = (0..before).map(|_| Ok(ConnectionState::Connecting)).collect();
        script.push(Ok(ConnectionState::Open));
        Self::scripted(script)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn poll_count(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn polls_for(&self, target: &str) -> usize {
        self.polls
            .lock()
            .unwrap()
            .iter()
            .filter(|(polled, _)| polled == target)
            .count()
    }

    pub fn poll_times(&self) -> Vec<Instant> {
        self.polls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl StatusProbe for ScriptedProbe {
    async fn connection_state(&self, instance: &str) -> Result<ConnectionState, TransportError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .push((instance.to_string(), Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Status probe whose every poll panics.
pub struct PanickingProbe;

#[async_trait]
impl StatusProbe for PanickingProbe {
    async fn connection_state(&self, instance: &str) -> Result<ConnectionState, TransportError> {
        panic!("status backend for {instance} blew up");
    }
}

/// Counts how many times a terminal callback fired.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// A callback that bumps this counter.
    pub fn callback(&self) -> impl FnOnce() + Send + 'static {
        let counter = Arc::clone(&self.0);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

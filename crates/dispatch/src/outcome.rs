//! Per-recipient outcomes of a bulk dispatch.

use serde::Serialize;

/// Terminal classification of one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeState {
    /// The gateway accepted the message.
    Sent,
    /// The gateway rejected the message; `detail` says why.
    Failed,
    /// The entry was blank after trimming; nothing was sent.
    Skipped,
    /// The run was cancelled before this entry was attempted.
    Cancelled,
}

impl OutcomeState {
    /// Only downstream rejections are worth retrying. Cancelled entries
    /// were stopped by the operator.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Outcome of one recipient within a dispatch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// The recipient as sent, i.e. trimmed.
    pub recipient: String,
    pub state: OutcomeState,
    /// Failure reason for [`OutcomeState::Failed`], verbatim from the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DispatchOutcome {
    pub fn sent(recipient: impl Into<String>) -> Self {
        Self::new(recipient, OutcomeState::Sent, None)
    }

    pub fn failed(recipient: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(recipient, OutcomeState::Failed, Some(detail.into()))
    }

    pub fn skipped(recipient: impl Into<String>) -> Self {
        Self::new(recipient, OutcomeState::Skipped, None)
    }

    pub fn cancelled(recipient: impl Into<String>) -> Self {
        Self::new(recipient, OutcomeState::Cancelled, None)
    }

    fn new(recipient: impl Into<String>, state: OutcomeState, detail: Option<String>) -> Self {
        Self {
            recipient: recipient.into(),
            state,
            detail,
        }
    }
}

/// Per-state counts over a list of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl DispatchSummary {
    pub fn from_outcomes(outcomes: &[DispatchOutcome]) -> Self {
        outcomes.iter().fold(
            Self {
                total: outcomes.len(),
                ..Self::default()
            },
            |mut summary, outcome| {
                match outcome.state {
                    OutcomeState::Sent => summary.sent += 1,
                    OutcomeState::Failed => summary.failed += 1,
                    OutcomeState::Skipped => summary.skipped += 1,
                    OutcomeState::Cancelled => summary.cancelled += 1,
                }
                summary
            },
        )
    }

    /// True when every recipient was either sent or skipped.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// Recipients whose outcome is retryable, in their original order.
pub fn retryable_recipients(outcomes: &[DispatchOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter(|outcome| outcome.state.is_retryable())
        .map(|outcome| outcome.recipient.clone())
        .collect()
}

//! Collaborator contracts for the dispatcher and the pairing watcher.
//!
//! Both loops are written against these traits rather than a concrete
//! HTTP client, so they can be driven by the gateway client in
//! production and by in-memory fakes in tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::ConnectionState;

/// Fallback failure text used when a transport error carries no message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

/// Failure reported by a single send or status call.
///
/// `message` is opaque diagnostic text passed through from the
/// downstream system; it is not a structured error code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", message_or_fallback(.message))]
pub struct TransportError {
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// The message, or [`GENERIC_FAILURE_MESSAGE`] when it is blank.
    pub fn display_message(&self) -> &str {
        message_or_fallback(&self.message)
    }
}

fn message_or_fallback(message: &str) -> &str {
    if message.trim().is_empty() {
        GENERIC_FAILURE_MESSAGE
    } else {
        message
    }
}

/// Sends one text message through a messaging instance.
///
/// A single attempt with no built-in retry.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(
        &self,
        instance: &str,
        recipient: &str,
        message: &str,
    ) -> Result<(), TransportError>;
}

/// Reports the current connection state of a messaging instance.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn connection_state(&self, instance: &str) -> Result<ConnectionState, TransportError>;
}

#[async_trait]
impl<T: MessageSender + ?Sized> MessageSender for Arc<T> {
    async fn send_text(
        &self,
        instance: &str,
        recipient: &str,
        message: &str,
    ) -> Result<(), TransportError> {
        (**self).send_text(instance, recipient, message).await
    }
}

#[async_trait]
impl<T: StatusProbe + ?Sized> StatusProbe for Arc<T> {
    async fn connection_state(&self, instance: &str) -> Result<ConnectionState, TransportError> {
        (**self).connection_state(instance).await
    }
}

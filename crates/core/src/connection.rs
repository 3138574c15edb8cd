//! Connection-state vocabulary reported by the gateway.
//!
//! The gateway reports the state of a messaging instance as a bare
//! string. Only `open` means the instance is paired and usable; every
//! other value is treated as non-terminal by the pairing watcher.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The instance is paired and can send messages.
pub const STATE_OPEN: &str = "open";

/// A pairing handshake is in progress.
pub const STATE_CONNECTING: &str = "connecting";

/// The instance is not connected.
pub const STATE_CLOSE: &str = "close";

/// Connection state of a single messaging instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionState {
    Open,
    Connecting,
    Close,
    /// Any value the gateway reports that we do not recognise.
    Unknown(String),
}

impl ConnectionState {
    /// Parse a gateway state string. Matching is case-insensitive and
    /// ignores surrounding whitespace.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(STATE_OPEN) {
            Self::Open
        } else if trimmed.eq_ignore_ascii_case(STATE_CONNECTING) {
            Self::Connecting
        } else if trimmed.eq_ignore_ascii_case(STATE_CLOSE) {
            Self::Close
        } else {
            Self::Unknown(trimmed.to_string())
        }
    }

    /// Whether this is the terminal "paired" state.
    pub fn is_paired(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Wire representation of the state.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => STATE_OPEN,
            Self::Connecting => STATE_CONNECTING,
            Self::Close => STATE_CLOSE,
            Self::Unknown(raw) => raw,
        }
    }

    /// Short human-readable label for status badges.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Connected",
            Self::Connecting => "Connecting",
            Self::Close | Self::Unknown(_) => "Disconnected",
        }
    }
}

impl From<String> for ConnectionState {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ConnectionState> for String {
    fn from(state: ConnectionState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

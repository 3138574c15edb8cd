//! Shared domain types for the TAGUATO-SEND panel.
//!
//! Holds the pieces every other crate agrees on: gateway limits and
//! timing constants, the connection-state vocabulary, recipient list
//! helpers, and the collaborator traits the dispatcher and watcher are
//! written against.

pub mod connection;
pub mod error;
pub mod limits;
pub mod recipients;
pub mod transport;

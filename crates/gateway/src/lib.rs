//! REST client for the TAGUATO-SEND messaging gateway.
//!
//! Wraps the gateway endpoints the panel's coordination loops need
//! (sending a text message, reading an instance's connection state, and
//! requesting a pairing prompt) and implements the
//! [`taguato_core::transport`] contracts on top of them.

pub mod api;
pub mod pairing;

pub use api::{GatewayApi, GatewayApiError};
pub use pairing::{ConnectResponse, PairingPrompt};

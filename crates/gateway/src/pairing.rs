//! Pairing prompt returned by `GET /instance/connect/{instance}`.
//!
//! Depending on how the instance is configured the gateway answers with
//! a QR code image, a numeric pairing code, or the state of an instance
//! that is already open.

use serde::Deserialize;
use taguato_core::connection::ConnectionState;

/// Decoded body of a connect request.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    /// QR code as a `data:image/png;base64,...` URI.
    pub base64: Option<String>,
    /// Code to type on the phone instead of scanning a QR.
    #[serde(rename = "pairingCode")]
    pub pairing_code: Option<String>,
    pub instance: Option<ConnectInstance>,
    /// The full body, kept for bodies we cannot classify.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectInstance {
    pub state: Option<ConnectionState>,
}

/// What the operator has to do to finish pairing.
#[derive(Debug, Clone, PartialEq)]
pub enum PairingPrompt {
    /// Scan this QR code (base64 image URI) with the phone.
    QrCode(String),
    /// Enter this code on the phone.
    PairingCode(String),
    /// Nothing to do; the instance is already open.
    AlreadyConnected,
    /// A body we do not recognise, passed through for display.
    Unrecognized(serde_json::Value),
}

impl ConnectResponse {
    pub(crate) fn from_json(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut response: ConnectResponse = serde_json::from_value(raw.clone())?;
        response.raw = raw;
        Ok(response)
    }

    /// Classify the response. A QR code wins over a pairing code, which
    /// wins over an already-open instance.
    pub fn prompt(&self) -> PairingPrompt {
        if let Some(qr) = non_empty(&self.base64) {
            return PairingPrompt::QrCode(qr.to_string());
        }
        if let Some(code) = non_empty(&self.pairing_code) {
            return PairingPrompt::PairingCode(code.to_string());
        }
        let open = self
            .instance
            .as_ref()
            .and_then(|instance| instance.state.as_ref())
            .is_some_and(ConnectionState::is_paired);
        if open {
            return PairingPrompt::AlreadyConnected;
        }
        PairingPrompt::Unrecognized(self.raw.clone())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

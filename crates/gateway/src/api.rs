//! HTTP client for the gateway REST endpoints.
//!
//! Every request is JSON and, when an API key is configured, carries it
//! in the `apikey` header the gateway expects.

use async_trait::async_trait;
use serde::Deserialize;
use taguato_core::connection::ConnectionState;
use taguato_core::transport::{MessageSender, StatusProbe, TransportError, GENERIC_FAILURE_MESSAGE};

use crate::pairing::ConnectResponse;

/// Header carrying the caller's API key.
const API_KEY_HEADER: &str = "apikey";

/// HTTP client for one gateway deployment.
#[derive(Clone)]
pub struct GatewayApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Errors from the gateway REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Gateway error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The `error` (or `message`) field of the response body.
        message: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

/// Body of `GET /instance/connectionState/{instance}`.
#[derive(Debug, Deserialize)]
struct ConnectionStateResponse {
    instance: Option<InstanceStatus>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstanceStatus {
    state: Option<String>,
}

impl ConnectionStateResponse {
    fn into_state(self) -> ConnectionState {
        self.instance
            .and_then(|instance| instance.state)
            .or(self.state)
            .map(|raw| ConnectionState::parse(&raw))
            .unwrap_or_else(|| ConnectionState::Unknown("unknown".to_string()))
    }
}

impl GatewayApi {
    /// Create a client for a gateway at `base_url`, e.g. `http://host:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for sharing timeouts and connection pooling).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: None,
        }
    }

    /// Attach the API key sent with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a text message to `number` through `instance`.
    ///
    /// `POST /message/sendText/{instance}`. Returns the gateway's JSON
    /// acknowledgement unchanged.
    pub async fn send_text(
        &self,
        instance: &str,
        number: &str,
        text: &str,
    ) -> Result<serde_json::Value, GatewayApiError> {
        tracing::debug!(instance, number, "Sending text message");
        let body = serde_json::json!({
            "number": number,
            "text": text,
        });

        let response = self
            .request(reqwest::Method::POST, &format!("/message/sendText/{instance}"))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Read the connection state of `instance`.
    ///
    /// `GET /instance/connectionState/{instance}`.
    pub async fn connection_state(
        &self,
        instance: &str,
    ) -> Result<ConnectionState, GatewayApiError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/instance/connectionState/{instance}"),
            )
            .send()
            .await?;

        let body: ConnectionStateResponse = Self::parse_response(response).await?;
        let state = body.into_state();
        tracing::debug!(instance, state = %state, "Fetched connection state");
        Ok(state)
    }

    /// Ask the gateway to start pairing `instance`.
    ///
    /// `GET /instance/connect/{instance}`. The response carries a QR
    /// code, a pairing code, or the already-open instance state.
    pub async fn connect_instance(
        &self,
        instance: &str,
    ) -> Result<ConnectResponse, GatewayApiError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/instance/connect/{instance}"))
            .send()
            .await?;

        let raw: serde_json::Value = Self::parse_response(response).await?;
        ConnectResponse::from_json(raw).map_err(|e| GatewayApiError::Decode(e.to_string()))
    }

    // ---- private helpers ----

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// Ensure the response has a success status code, turning failures
    /// into [`GatewayApiError::Api`] with the body's error text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayApiError::Api {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayApiError::Decode(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body.
///
/// Prefers the `error` field, then `message`; anything else falls back
/// to the generic failure text.
fn error_message_from_body(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        })
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or(GENERIC_FAILURE_MESSAGE)
        .to_string()
}

impl From<GatewayApiError> for TransportError {
    fn from(err: GatewayApiError) -> Self {
        match err {
            GatewayApiError::Api { status, message } => {
                TransportError::with_status(status, message)
            }
            GatewayApiError::Request(e) => TransportError {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            GatewayApiError::Decode(msg) => TransportError::new(msg),
        }
    }
}

#[async_trait]
impl MessageSender for GatewayApi {
    async fn send_text(
        &self,
        instance: &str,
        recipient: &str,
        message: &str,
    ) -> Result<(), TransportError> {
        GatewayApi::send_text(self, instance, recipient, message).await?;
        Ok(())
    }
}

#[async_trait]
impl StatusProbe for GatewayApi {
    async fn connection_state(&self, instance: &str) -> Result<ConnectionState, TransportError> {
        Ok(GatewayApi::connection_state(self, instance).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins() {
        let msg = error_message_from_body(r#"{"error":"Instance not found","message":"x"}"#);
        assert_eq!(msg, "Instance not found");
    }

    #[test]
    fn message_field_is_second_choice() {
        let msg = error_message_from_body(r#"{"message":"rate limited"}"#);
        assert_eq!(msg, "rate limited");
    }

    #[test]
    fn non_json_body_falls_back() {
        assert_eq!(error_message_from_body("<html>502</html>"), GENERIC_FAILURE_MESSAGE);
        assert_eq!(error_message_from_body(""), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn state_prefers_nested_instance() {
        let body: ConnectionStateResponse =
            serde_json::from_str(r#"{"instance":{"instanceName":"a","state":"open"}}"#).unwrap();
        assert_eq!(body.into_state(), ConnectionState::Open);

        let body: ConnectionStateResponse =
            serde_json::from_str(r#"{"state":"connecting"}"#).unwrap();
        assert_eq!(body.into_state(), ConnectionState::Connecting);
    }

    #[test]
    fn missing_state_is_unknown() {
        let body: ConnectionStateResponse = serde_json::from_str("{}").unwrap();
        assert!(!body.into_state().is_paired());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = GatewayApi::new("http://localhost:8080/");
        assert_eq!(api.base_url(), "http://localhost:8080");
    }
}

//! Outbound request seam between the controller and the network.

use async_trait::async_trait;
use serde_json::Value;

use crate::ClientError;

/// A response as received, before any interpretation.
///
/// The status is informational only; the body drives normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one JSON POST and returns whatever came back.
///
/// An `Err` means nothing usable was received (connection, TLS, timeout).
/// Dropping the returned future must abort the request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, ClientError>;
}

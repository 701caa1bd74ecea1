//! reqwest-backed transport for the classification service.

use async_trait::async_trait;
use serde_json::Value;
use smishguard_core::ClientConfig;
use tracing::{info, warn};

use crate::{ClientError, Transport, TransportResponse};

/// HTTP transport for the classification service.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport honouring the config's request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Probe the service's liveness endpoint.
    pub async fn health(&self, config: &ClientConfig) -> Result<(), ClientError> {
        let url = config.health_url();
        info!(url = %url, "checking classification service health");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, ClientError> {
        let resp = self.client.post(url).json(body).send().await?;
        let status = resp.status().as_u16();

        // Headers arrived, so this counts as a response even if the body is lost.
        let body = match resp.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                warn!(status, error = %e, "failed to read response body");
                Vec::new()
            }
        };

        Ok(TransportResponse { status, body })
    }
}

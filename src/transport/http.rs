use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{RpcReply, RpcRequest, RpcTransport};
use crate::error::{Error, Result};

/// JSON-RPC over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config {
                reason: format!("http client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, request: &RpcRequest) -> Result<RpcReply> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::TransportFailure {
                reason: format!("{} request failed: {e}", request.method),
            })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| Error::TransportFailure {
            reason: format!("{} body read failed: {e}", request.method),
        })?;

        // Gateways answer 429/5xx with plain text or html; keep it for the error message.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(RpcReply {
            status,
            headers,
            body,
        })
    }
}

//! Transport gateway: `send(method, args) -> bytes`. The ingestion loop depends only on the
//! [`Gateway`] trait; [`HttpGateway`] is the reqwest implementation against the Bot API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tgflow_core::{mask_token, BotError, Result};
use tracing::{debug, instrument};

/// Performs one Bot API call. Returns the raw response body; a transport-level failure (connect,
/// timeout, body read) is [`BotError::Transport`]. Remote errors stay inside the body's envelope.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, method: &str, args: &Value) -> Result<Vec<u8>>;
}

/// JSON-over-HTTPS gateway: POSTs `args` to `{api_url}/bot{token}/{method}`.
pub struct HttpGateway {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl HttpGateway {
    /// `request_timeout` must exceed the long-poll timeout or every idle poll ends as a transport
    /// error.
    pub fn new(api_url: &str, token: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BotError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip(self, args), fields(token = %mask_token(&self.token)))]
    async fn send(&self, method: &str, args: &Value) -> Result<Vec<u8>> {
        let resp = self
            .client
            .post(self.method_url(method))
            .json(args)
            .send()
            .await
            .map_err(|e| BotError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| BotError::Transport(e.without_url().to_string()))?;
        debug!(method = %method, status = %status, body_len = body.len(), "Gateway call done");
        Ok(body.to_vec())
    }
}

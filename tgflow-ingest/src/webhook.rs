//! Webhook ingestion: push entry point for updates decoded by an external HTTPS listener, plus the
//! `setWebhook` / `deleteWebhook` calls that switch the bot between push and pull delivery.

use std::sync::Arc;

use serde_json::{json, Value};
use tgflow_core::{ApiResponse, BotError, Result, Update};
use tracing::{info, instrument};

use crate::classifier::{BatchSummary, Classifier};
use crate::config::WebhookConfig;
use crate::gateway::Gateway;
use crate::offset::OffsetTracker;

/// Routes pushed updates through the same classification, fan-out and dispatch as the poll loop.
/// Cheap to clone; hand one to each listener worker.
#[derive(Clone)]
pub struct WebhookAdapter {
    classifier: Arc<Classifier>,
    offset: Arc<OffsetTracker>,
}

impl WebhookAdapter {
    pub(crate) fn new(classifier: Arc<Classifier>, offset: Arc<OffsetTracker>) -> Self {
        Self { classifier, offset }
    }

    /// Processes one decoded update and records its id. Returns the id.
    #[instrument(skip(self, update), fields(update_id = update.update_id))]
    pub async fn ingest(&self, update: Update) -> i64 {
        let update_id = self.classifier.classify_update(update).await;
        self.offset.advance(update_id);
        update_id
    }

    /// Decodes a single update object from a request body, then [`WebhookAdapter::ingest`]s it.
    pub async fn ingest_json(&self, body: &[u8]) -> Result<i64> {
        let update: Update = serde_json::from_slice(body)?;
        Ok(self.ingest(update).await)
    }

    /// Processes a saved `getUpdates` envelope the same way the poll loop would.
    pub async fn ingest_batch(&self, body: &[u8]) -> Result<BatchSummary> {
        let summary = self.classifier.classify_batch(body).await?;
        if let Some(max) = summary.max_update_id {
            self.offset.advance(max);
        }
        Ok(summary)
    }
}

/// Calls `setWebhook`. `allowed_updates` empty means the server default.
pub async fn register_webhook(
    gateway: &dyn Gateway,
    config: &WebhookConfig,
    allowed_updates: &[String],
) -> Result<()> {
    let mut args = json!({
        "url": config.url,
        "max_connections": config.max_connections,
    });
    if let Some(secret) = &config.secret_token {
        args["secret_token"] = json!(secret);
    }
    if let Some(ip) = &config.ip_address {
        args["ip_address"] = json!(ip);
    }
    if !allowed_updates.is_empty() {
        args["allowed_updates"] = json!(allowed_updates);
    }
    call_expecting_ok(gateway, "setWebhook", &args).await?;
    info!(url = %config.url, "Webhook registered");
    Ok(())
}

/// Calls `deleteWebhook`, which polling requires. `drop_pending` discards queued updates.
pub async fn delete_webhook(gateway: &dyn Gateway, drop_pending: bool) -> Result<()> {
    call_expecting_ok(
        gateway,
        "deleteWebhook",
        &json!({ "drop_pending_updates": drop_pending }),
    )
    .await?;
    info!(drop_pending = drop_pending, "Webhook deleted");
    Ok(())
}

async fn call_expecting_ok(gateway: &dyn Gateway, method: &str, args: &Value) -> Result<()> {
    let body = gateway.send(method, args).await?;
    let resp: ApiResponse<Value> = serde_json::from_slice(&body)?;
    if !resp.ok {
        return Err(BotError::RemoteFailure {
            code: resp.error_code,
            description: resp
                .description
                .unwrap_or_else(|| format!("{} failed", method)),
        });
    }
    Ok(())
}

//! Turns a raw `getUpdates` body into typed updates: validates the envelope, offers each update to
//! handler dispatch, then hands it to its fan-out stream.

use std::sync::Arc;

use serde_json::Value;
use tgflow_core::{ApiResponse, BotError, Result, Update};
use tgflow_dispatch::Dispatcher;
use tracing::{debug, warn};

use crate::fanout::Fanout;

/// Result of classifying one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Highest `update_id` in the batch, including items that failed to decode.
    pub max_update_id: Option<i64>,
    pub received: usize,
    /// Items skipped because they did not decode as an update.
    pub skipped: usize,
}

pub struct Classifier {
    fanout: Arc<Fanout>,
    dispatcher: Arc<Dispatcher>,
}

impl Classifier {
    pub fn new(fanout: Arc<Fanout>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { fanout, dispatcher }
    }

    /// Classifies a batch envelope in arrival order. `ok: false` is [`BotError::RemoteFailure`];
    /// bytes that are not an envelope are [`BotError::MalformedPayload`].
    ///
    /// Only an undecodable envelope yields `MalformedPayload`: single items that fail to decode are
    /// skipped and counted in [`BatchSummary::skipped`], and the batch still succeeds.
    pub async fn classify_batch(&self, raw: &[u8]) -> Result<BatchSummary> {
        let envelope: ApiResponse<Vec<Value>> = serde_json::from_slice(raw)?;
        if !envelope.ok {
            return Err(BotError::RemoteFailure {
                code: envelope.error_code,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        let items = envelope.result.ok_or_else(|| {
            BotError::MalformedPayload(<serde_json::Error as serde::de::Error>::missing_field(
                "result",
            ))
        })?;

        let mut summary = BatchSummary {
            received: items.len(),
            ..BatchSummary::default()
        };
        for item in items {
            let id_hint = item.get("update_id").and_then(Value::as_i64);
            let id = match serde_json::from_value::<Update>(item) {
                Ok(update) => Some(self.classify_update(update).await),
                Err(e) => {
                    // Still counted toward the offset so one bad item cannot pin the loop.
                    warn!(error = %e, update_id = ?id_hint, "Skipping undecodable update");
                    summary.skipped += 1;
                    id_hint
                }
            };
            summary.max_update_id = summary.max_update_id.max(id);
        }
        Ok(summary)
    }

    /// Dispatches and fans out a single decoded update. Returns its `update_id`.
    pub async fn classify_update(&self, update: Update) -> i64 {
        let update_id = update.update_id;
        debug!(update_id = update_id, kind = update.kind_name(), "step: classifying update");
        self.dispatcher.dispatch(&update);
        self.fanout.deliver(update).await;
        update_id
    }
}

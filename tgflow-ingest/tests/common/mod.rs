//! Scripted [`Gateway`] and update builders shared by the ingestion integration tests.
//!
//! The gateway replays queued responses in order and records every call, so tests can assert on
//! the offsets the loop requested without touching the network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tgflow_core::{BotError, Result};
use tgflow_ingest::{BotConfig, Gateway};

/// One recorded gateway call.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub method: String,
    pub args: Value,
}

/// Gateway that answers from a queue; an empty queue answers with an empty batch.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<Vec<u8>>>>,
    calls: Mutex<Vec<CallRecord>>,
    call_count: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_body(&self, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(body.to_string().into_bytes()));
    }

    pub fn push_raw(&self, raw: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(raw.as_bytes().to_vec()));
    }

    pub fn push_transport_error(&self, msg: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(BotError::Transport(msg.to_string())));
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn send(&self, method: &str, args: &Value) -> Result<Vec<u8>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(CallRecord {
            method: method.to_string(),
            args: args.clone(),
        });
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(br#"{"ok": true, "result": []}"#.to_vec()))
    }
}

/// Config with a per-test token (one live interface per token) and a short poll interval.
pub fn test_config(token: &str) -> BotConfig {
    let mut config = BotConfig::with_token(token);
    config.poll_interval = std::time::Duration::from_millis(10);
    config.channel_capacity = 4;
    config
}

pub fn text_item(update_id: i64, text: &str, chat_type: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": 1_700_000_000,
            "chat": {"id": 456, "type": chat_type},
            "from": {"id": 123, "is_bot": false, "first_name": "Test"},
            "text": text
        }
    })
}

pub fn poll_item(update_id: i64, poll_id: &str) -> Value {
    json!({
        "update_id": update_id,
        "poll": {
            "id": poll_id,
            "question": "Lunch?",
            "options": [{"text": "yes", "voter_count": 1}, {"text": "no", "voter_count": 0}],
            "is_closed": false,
            "total_voter_count": 1
        }
    })
}

pub fn callback_item(update_id: i64, data: &str) -> Value {
    json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb{}", update_id),
            "from": {"id": 123, "first_name": "Test"},
            "message": {"message_id": 1, "chat": {"id": 456, "type": "private"}},
            "data": data
        }
    })
}

pub fn batch(items: Vec<Value>) -> Value {
    json!({ "ok": true, "result": items })
}

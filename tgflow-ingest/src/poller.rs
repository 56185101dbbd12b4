//! Long-poll loop: sleep, `getUpdates` from the tracked offset, classify, repeat until stopped.
//!
//! Transport, remote and decoding failures are logged and the loop moves on to the next
//! iteration. Stopping is cooperative: an in-flight request and its classification always finish.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::{json, Value};
use tgflow_core::{BotError, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::classifier::{BatchSummary, Classifier};
use crate::config::BotConfig;
use crate::gateway::Gateway;
use crate::offset::OffsetTracker;

pub const GET_UPDATES: &str = "getUpdates";

/// Retrieval parameters taken from [`BotConfig`].
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub limit: u8,
    pub timeout_secs: u64,
    pub allowed_updates: Vec<String>,
}

impl PollSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            interval: config.poll_interval,
            limit: config.poll_limit,
            timeout_secs: config.poll_timeout_secs,
            allowed_updates: config.allowed_updates.clone(),
        }
    }

    /// `getUpdates` arguments for the given offset.
    pub fn request_args(&self, offset: i64) -> Value {
        let mut args = json!({
            "offset": offset,
            "limit": self.limit,
            "timeout": self.timeout_secs,
        });
        if !self.allowed_updates.is_empty() {
            args["allowed_updates"] = json!(self.allowed_updates);
        }
        args
    }
}

struct PollLoop {
    gateway: Arc<dyn Gateway>,
    classifier: Arc<Classifier>,
    offset: Arc<OffsetTracker>,
    settings: PollSettings,
}

impl PollLoop {
    async fn poll_once(&self) -> Result<BatchSummary> {
        let offset = self.offset.next_offset();
        let body = self
            .gateway
            .send(GET_UPDATES, &self.settings.request_args(offset))
            .await?;
        let summary = self.classifier.classify_batch(&body).await?;
        if let Some(max) = summary.max_update_id {
            if self.offset.advance(max) {
                debug!(last_seen = max, "Offset advanced");
            }
        }
        Ok(summary)
    }

    #[instrument(skip_all)]
    async fn run(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        info!(
            interval_ms = self.settings.interval.as_millis() as u64,
            limit = self.settings.limit,
            timeout_secs = self.settings.timeout_secs,
            "Polling loop started"
        );
        loop {
            if *stop_rx.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                _ = stop_rx.changed() => break,
            }
            if *stop_rx.borrow() {
                break;
            }

            match self.poll_once().await {
                Ok(summary) if summary.received > 0 => info!(
                    received = summary.received,
                    skipped = summary.skipped,
                    last_seen = self.offset.last_seen(),
                    "step: batch classified"
                ),
                Ok(_) => {}
                Err(e @ BotError::Transport(_)) => {
                    warn!(error = %e, offset = self.offset.next_offset(), "getUpdates transport error");
                }
                Err(e) => {
                    warn!(error = %e, offset = self.offset.next_offset(), "getUpdates batch rejected");
                }
            }
        }
        info!(last_seen = self.offset.last_seen(), "Polling loop stopped");
    }
}

struct Running {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns the polling task's lifecycle: at most one loop at a time.
pub struct Poller {
    inner: Arc<PollLoop>,
    running: Mutex<Option<Running>>,
}

impl Poller {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        classifier: Arc<Classifier>,
        offset: Arc<OffsetTracker>,
        settings: PollSettings,
    ) -> Self {
        Self {
            inner: Arc::new(PollLoop {
                gateway,
                classifier,
                offset,
                settings,
            }),
            running: Mutex::new(None),
        }
    }

    /// Spawns the loop on the current tokio runtime and returns immediately. Fails with
    /// [`BotError::AlreadyRunning`] while a previous loop has not exited, even if it was asked to stop.
    pub fn start(&self) -> Result<()> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            return Err(BotError::AlreadyRunning);
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.inner.clone().run(stop_rx));
        *running = Some(Running { stop_tx, task });
        Ok(())
    }

    /// Asks the loop to exit after its current iteration. No-op when not running.
    pub fn stop(&self) {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(r) = running.as_ref() {
            // Fails only when the loop already exited and dropped its receiver.
            let _ = r.stop_tx.send(true);
        }
    }

    /// [`Poller::stop`] and wait for the loop task to finish.
    pub async fn shutdown(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(r) = running {
            let _ = r.stop_tx.send(true);
            if let Err(e) = r.task.await {
                warn!(error = %e, "Polling task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    /// One retrieval + classification outside the loop, advancing the offset like the loop does.
    pub async fn poll_once(&self) -> Result<BatchSummary> {
        self.inner.poll_once().await
    }
}

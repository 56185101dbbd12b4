//! [`Bot`]: one ingestion interface per bot token. Owns the offset, fan-out streams, handler
//! registry and the polling task, and hands out the webhook adapter as the alternative entry point.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tgflow_core::{
    mask_token, BotError, ChatMemberUpdated, Poll, PollAnswer, Result, Update, UpdateHandler,
};
use tgflow_dispatch::Dispatcher;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::classifier::{BatchSummary, Classifier};
use crate::config::BotConfig;
use crate::fanout::Fanout;
use crate::gateway::{Gateway, HttpGateway};
use crate::offset::OffsetTracker;
use crate::poller::{PollSettings, Poller};
use crate::webhook::{self, WebhookAdapter};

/// Tokens with a live [`Bot`]. The server keeps one long-poll offset per token, so two interfaces
/// on the same token would race each other's confirmations.
fn active_tokens() -> &'static Mutex<HashSet<String>> {
    static ACTIVE: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    ACTIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

pub struct Bot {
    config: BotConfig,
    gateway: Arc<dyn Gateway>,
    dispatcher: Arc<Dispatcher>,
    fanout: Arc<Fanout>,
    offset: Arc<OffsetTracker>,
    classifier: Arc<Classifier>,
    poller: Poller,
    /// Set once the webhook adapter has been handed out; polling is refused afterwards.
    webhook_mode: Mutex<bool>,
}

impl Bot {
    /// Builds an interface over `gateway`. Fails with [`BotError::DuplicateInterface`] if another
    /// live `Bot` uses the same token. `config` is expected to be validated already.
    pub fn new(config: BotConfig, gateway: Arc<dyn Gateway>) -> Result<Self> {
        let claimed = active_tokens()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(config.bot_token.clone());
        if !claimed {
            return Err(BotError::DuplicateInterface(mask_token(&config.bot_token)));
        }

        let dispatcher = Arc::new(Dispatcher::new(config.match_strategy));
        let fanout = Arc::new(Fanout::new(config.channel_capacity));
        let offset = Arc::new(OffsetTracker::new());
        let classifier = Arc::new(Classifier::new(fanout.clone(), dispatcher.clone()));
        let poller = Poller::new(
            gateway.clone(),
            classifier.clone(),
            offset.clone(),
            PollSettings::from_config(&config),
        );

        info!(
            token = %mask_token(&config.bot_token),
            strategy = %config.match_strategy,
            "Bot interface created"
        );

        Ok(Self {
            config,
            gateway,
            dispatcher,
            fanout,
            offset,
            classifier,
            poller,
            webhook_mode: Mutex::new(false),
        })
    }

    /// Builds an interface with the reqwest [`HttpGateway`].
    pub fn from_config(config: BotConfig) -> Result<Self> {
        let gateway = HttpGateway::new(
            &config.api_url,
            &config.bot_token,
            config.request_timeout(),
        )?;
        Self::new(config, Arc::new(gateway))
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn gateway(&self) -> Arc<dyn Gateway> {
        self.gateway.clone()
    }

    /// Registers a text handler for `pattern` within `scopes` (`"all"` for every chat type).
    pub fn register_pattern<I, S, H>(&self, pattern: &str, scopes: I, handler: H) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        H: UpdateHandler + 'static,
    {
        self.dispatcher
            .register_pattern(pattern, scopes, Arc::new(handler))
    }

    /// Registers a callback handler selected when callback data equals `key`.
    pub fn register_exact<H>(&self, key: impl Into<String>, handler: H)
    where
        H: UpdateHandler + 'static,
    {
        self.dispatcher.register_exact(key, Arc::new(handler));
    }

    /// Generic update stream; `None` after the first call.
    pub fn updates(&self) -> Option<mpsc::Receiver<Update>> {
        self.fanout.updates()
    }

    pub fn polls(&self) -> Option<mpsc::Receiver<Poll>> {
        self.fanout.polls()
    }

    pub fn poll_answers(&self) -> Option<mpsc::Receiver<PollAnswer>> {
        self.fanout.poll_answers()
    }

    pub fn chat_members(&self) -> Option<mpsc::Receiver<ChatMemberUpdated>> {
        self.fanout.chat_members()
    }

    /// Starts long polling. Must be called inside a tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&self) -> Result<()> {
        let webhook_mode = self.webhook_mode.lock().unwrap_or_else(PoisonError::into_inner);
        if *webhook_mode {
            return Err(BotError::ModeConflict(
                "webhook adapter is active; polling is unavailable".to_string(),
            ));
        }
        self.poller.start()?;
        info!(offset = self.offset.next_offset(), "step: polling started");
        Ok(())
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    /// Stops polling and waits for the loop to exit.
    pub async fn shutdown(&self) {
        self.poller.shutdown().await;
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    /// Last seen `update_id` (zero before anything arrived).
    pub fn offset(&self) -> i64 {
        self.offset.last_seen()
    }

    /// One `getUpdates` round outside the loop; refused while the loop runs.
    pub async fn poll_once(&self) -> Result<BatchSummary> {
        if self.poller.is_running() {
            return Err(BotError::AlreadyRunning);
        }
        self.poller.poll_once().await
    }

    /// Switches the interface to push mode and returns the adapter. Fails while polling runs.
    pub fn webhook(&self) -> Result<WebhookAdapter> {
        let mut webhook_mode = self.webhook_mode.lock().unwrap_or_else(PoisonError::into_inner);
        if self.poller.is_running() {
            return Err(BotError::ModeConflict(
                "polling is running; stop it before using the webhook adapter".to_string(),
            ));
        }
        *webhook_mode = true;
        Ok(WebhookAdapter::new(self.classifier.clone(), self.offset.clone()))
    }

    /// `setWebhook` from the configured [`crate::WebhookConfig`].
    pub async fn register_webhook(&self) -> Result<()> {
        let hook = self
            .config
            .webhook
            .as_ref()
            .ok_or_else(|| BotError::Config("WEBHOOK_URL not set".to_string()))?;
        webhook::register_webhook(self.gateway.as_ref(), hook, &self.config.allowed_updates).await
    }

    pub async fn delete_webhook(&self, drop_pending: bool) -> Result<()> {
        webhook::delete_webhook(self.gateway.as_ref(), drop_pending).await
    }
}

impl Drop for Bot {
    fn drop(&mut self) {
        self.poller.stop();
        active_tokens()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.config.bot_token);
    }
}

//! # tgflow-ingest
//!
//! Update ingestion: the long-poll loop with offset tracking, the classifier that splits batches
//! into typed streams and offers each update to handler dispatch, and the webhook adapter as the
//! push-mode entry point. [`Bot`] ties them together per bot token.

mod bot;
mod classifier;
mod config;
mod fanout;
mod gateway;
mod offset;
mod poller;
mod webhook;

pub use bot::Bot;
pub use classifier::{BatchSummary, Classifier};
pub use config::{BotConfig, WebhookConfig, DEFAULT_API_URL};
pub use fanout::{route, Fanout, StreamKind};
pub use gateway::{Gateway, HttpGateway};
pub use offset::OffsetTracker;
pub use poller::{PollSettings, Poller, GET_UPDATES};
pub use webhook::{delete_webhook, register_webhook, WebhookAdapter};

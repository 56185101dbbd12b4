//! # tgflow-core
//!
//! Core types shared by the dispatch and ingestion crates: [`Update`] and its payloads, the
//! [`UpdateHandler`] trait, [`BotError`], and tracing initialization. No I/O beyond the log file.

pub mod error;
pub mod handler;
pub mod logger;
pub mod types;

pub use error::{BotError, HandlerError, Result};
pub use handler::{handler_fn, FnHandler, UpdateHandler};
pub use logger::{init_tracing, mask_token};
pub use types::{
    ApiResponse, CallbackQuery, Chat, ChatMemberUpdated, Message, Poll, PollAnswer, PollOption,
    Update, UpdateKind, User, SCOPE_ALL,
};

//! Handlers and stream consumers wired up by `tgflow run` and `tgflow replay`.

use tgflow_core::{handler_fn, Result, Update, SCOPE_ALL};
use tgflow_ingest::Bot;
use tokio::task::JoinHandle;
use tracing::info;

/// Pattern for the `/start` command, with or without a `@botname` suffix.
pub const START_PATTERN: &str = r"^/start(@\w+)?(\s|$)";
/// Callback data answered by the `ping` handler.
pub const PING_KEY: &str = "ping";

/// Registers a `/start` pattern handler for every chat type and a `ping` callback handler. Both
/// only log that they ran.
pub fn register_handlers(bot: &Bot) -> Result<()> {
    bot.register_pattern(
        START_PATTERN,
        [SCOPE_ALL],
        handler_fn(|update: Update| async move {
            info!(
                update_id = update.update_id,
                scope = update.scope().unwrap_or_default(),
                "Received /start"
            );
            Ok(())
        }),
    )?;
    bot.register_exact(
        PING_KEY,
        handler_fn(|update: Update| async move {
            info!(update_id = update.update_id, "Received ping callback");
            Ok(())
        }),
    );
    Ok(())
}

/// Subscribes to every stream and logs what arrives. Each task ends when the bot is dropped.
pub fn spawn_stream_loggers(bot: &Bot) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();
    if let Some(mut rx) = bot.updates() {
        tasks.push(tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                info!(
                    update_id = update.update_id,
                    kind = update.kind_name(),
                    text = update.text().unwrap_or_default(),
                    "stream: update"
                );
            }
        }));
    }
    if let Some(mut rx) = bot.polls() {
        tasks.push(tokio::spawn(async move {
            while let Some(poll) = rx.recv().await {
                info!(
                    poll_id = %poll.id,
                    question = %poll.question,
                    total_voters = poll.total_voter_count,
                    "stream: poll"
                );
            }
        }));
    }
    if let Some(mut rx) = bot.poll_answers() {
        tasks.push(tokio::spawn(async move {
            while let Some(answer) = rx.recv().await {
                info!(poll_id = %answer.poll_id, options = ?answer.option_ids, "stream: poll answer");
            }
        }));
    }
    if let Some(mut rx) = bot.chat_members() {
        tasks.push(tokio::spawn(async move {
            while let Some(change) = rx.recv().await {
                info!(chat_id = change.chat.id, "stream: chat member");
            }
        }));
    }
    tasks
}

//! tgflow CLI: poll for updates, replay saved updates offline, manage the webhook. Config from env
//! (and `.env`) with an optional `--token` override.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tgflow_cli::{demo, load_config, Cli, Commands};
use tgflow_core::{init_tracing, mask_token};
use tgflow_ingest::{Bot, BotConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = setup(token)?;
            run(config).await
        }
        Commands::Replay { file, token } => {
            let config = setup(token)?;
            replay(config, &file).await
        }
        Commands::DeleteWebhook {
            token,
            drop_pending,
        } => {
            let bot = Bot::from_config(setup(token)?)?;
            bot.delete_webhook(drop_pending).await?;
            Ok(())
        }
        Commands::SetWebhook { token } => {
            let bot = Bot::from_config(setup(token)?)?;
            bot.register_webhook().await?;
            Ok(())
        }
    }
}

fn setup(token: Option<String>) -> Result<BotConfig> {
    let config = load_config(token)?;
    init_tracing(config.log_file.as_deref())?;
    info!(token = %mask_token(&config.bot_token), api_url = %config.api_url, "Config loaded");
    Ok(config)
}

async fn run(config: BotConfig) -> Result<()> {
    let bot = Bot::from_config(config)?;
    demo::register_handlers(&bot)?;
    let loggers = demo::spawn_stream_loggers(&bot);

    bot.start()?;
    info!("Polling; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Shutting down");
    bot.shutdown().await;
    drop(bot);
    for task in loggers {
        if let Err(e) = task.await {
            warn!(error = %e, "Stream logger ended abnormally");
        }
    }
    Ok(())
}

/// Replays `file` through the webhook adapter. A body with an `ok` field is treated as a
/// `getUpdates` response, anything else as a single update.
async fn replay(config: BotConfig, file: &Path) -> Result<()> {
    let body = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let is_envelope = serde_json::from_slice::<Value>(&body)
        .with_context(|| format!("{} is not JSON", file.display()))?
        .get("ok")
        .is_some();

    let bot = Bot::from_config(config)?;
    demo::register_handlers(&bot)?;
    let loggers = demo::spawn_stream_loggers(&bot);
    let adapter = bot.webhook()?;

    if is_envelope {
        let summary = adapter.ingest_batch(&body).await?;
        info!(
            received = summary.received,
            skipped = summary.skipped,
            last_seen = bot.offset(),
            "Replayed batch"
        );
    } else {
        let update_id = adapter.ingest_json(&body).await?;
        info!(update_id = update_id, "Replayed update");
    }

    drop(adapter);
    drop(bot);
    for task in loggers {
        if let Err(e) = task.await {
            warn!(error = %e, "Stream logger ended abnormally");
        }
    }
    Ok(())
}

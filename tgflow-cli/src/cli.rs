//! CLI parser and config loading.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tgflow_ingest::BotConfig;

#[derive(Parser)]
#[command(name = "tgflow")]
#[command(about = "Telegram update ingestion and dispatch", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Long-poll for updates and log every stream until Ctrl-C (token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Feed a saved getUpdates response or a single update through the webhook adapter.
    Replay {
        file: PathBuf,
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Remove the webhook so polling can be used.
    DeleteWebhook {
        #[arg(short, long)]
        token: Option<String>,
        /// Discard updates queued on the server.
        #[arg(long)]
        drop_pending: bool,
    },
    /// Register the webhook from WEBHOOK_URL and related settings.
    SetWebhook {
        #[arg(short, long)]
        token: Option<String>,
    },
}

/// Loads and validates [`BotConfig`] from the environment. `token` overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    let config = BotConfig::from_env(token)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delete_webhook_flags() {
        let cli = Cli::try_parse_from(["tgflow", "delete-webhook", "--drop-pending"]).unwrap();
        match cli.command {
            Commands::DeleteWebhook { token, drop_pending } => {
                assert!(token.is_none());
                assert!(drop_pending);
            }
            _ => panic!("expected delete-webhook"),
        }
    }

    #[test]
    fn test_parse_replay_requires_file() {
        assert!(Cli::try_parse_from(["tgflow", "replay"]).is_err());
        let cli = Cli::try_parse_from(["tgflow", "replay", "updates.json", "-t", "1:x"]).unwrap();
        match cli.command {
            Commands::Replay { file, token } => {
                assert_eq!(file, PathBuf::from("updates.json"));
                assert_eq!(token.as_deref(), Some("1:x"));
            }
            _ => panic!("expected replay"),
        }
    }
}

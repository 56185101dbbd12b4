//! # tgflow-cli
//!
//! Argument parsing, config loading, and the demo handlers the `tgflow` binary registers.

pub mod cli;
pub mod demo;

pub use cli::{load_config, Cli, Commands};
pub use tgflow_ingest::BotConfig;

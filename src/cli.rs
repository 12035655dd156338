// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines subcommands and global path/endpoint overrides

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "granola-relay")]
#[command(about = "Forward Granola meeting transcripts to a webhook", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Credentials file (refresh token + client id)
    #[arg(long, global = true, default_value = "config.json")]
    pub config: PathBuf,

    /// Sync state file (delivered document ids)
    #[arg(long, global = true, default_value = "sync_state.json")]
    pub state: PathBuf,

    /// Granola API base URL
    #[arg(long, global = true, default_value = "https://api.granola.ai")]
    pub api_base: String,

    /// OAuth token endpoint URL
    #[arg(long, global = true, default_value = crate::token::WORKOS_AUTH_URL)]
    pub token_url: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch new documents and deliver them to the webhook
    Sync {
        /// Webhook URL receiving one JSON payload per document
        #[arg(long)]
        webhook: String,

        /// Lookback window: only documents created in the last N hours
        #[arg(long, default_value_t = 24)]
        hours: u64,

        /// Re-deliver every document, ignoring the window and sync state
        #[arg(long)]
        all: bool,

        /// Print payloads instead of delivering; leaves all state untouched
        #[arg(long)]
        dry_run: bool,
    },

    /// Extract credentials from the local Granola app session
    Extract,

    /// Show credential, state, and webhook health
    Status {
        /// Webhook URL to probe for reachability
        #[arg(long)]
        webhook: Option<String>,
    },
}

// ABOUTME: CLI entrypoint for the granola-relay command
// ABOUTME: Handles error exit codes and command dispatch

use chrono::Utc;
use clap::Parser;
use granola_relay::{
    api::ApiClient,
    cli::{Cli, Commands},
    credentials::{CredentialPersistence, CredentialStore},
    extract,
    lock::RunLock,
    state::StateStore,
    sync::{self, SyncOptions},
    token::TokenManager,
    webhook::WebhookClient,
    Result,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("granola-relay: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let credentials = CredentialStore::new(cli.config.clone());
    let state_store = StateStore::new(cli.state.clone());

    match cli.command {
        Commands::Sync {
            webhook,
            hours,
            all,
            dry_run,
        } => {
            // Token rotation must not race a still-running invocation, so
            // the lock covers dry runs too.
            let lock_path = cli.state.with_extension("lock");
            let _lock = RunLock::acquire(lock_path)?;

            let manager = TokenManager::new(&credentials, Some(cli.token_url))?
                .with_app_writeback(extract::default_session_file());
            let token = manager.get_valid_access_token()?;

            let api = ApiClient::new(token.value, Some(cli.api_base))?;
            let webhook = WebhookClient::new(webhook)?;

            let opts = SyncOptions {
                since: Some(Utc::now() - chrono::Duration::hours(hours as i64)),
                full_resync: all,
                dry_run,
            };

            let report = sync::run(&api, &webhook, &state_store, &opts)?;

            println!(
                "Done! {} delivered, {} failed ({} new of {} candidates, {} already synced)",
                report.delivered,
                report.failed,
                report.attempted,
                report.attempted + report.skipped,
                report.skipped
            );
            if report.failed > 0 {
                eprintln!(
                    "{} document(s) failed to deliver and will be retried next run",
                    report.failed
                );
            }
        }

        Commands::Extract => {
            let cred = extract::extract_credentials(&credentials)?;
            println!(
                "Saved client {} to {}",
                cred.client_id,
                credentials.path().display()
            );
        }

        Commands::Status { webhook } => {
            match credentials.load() {
                Ok(cred) => println!(
                    "Credentials: ok (client {}, extracted {})",
                    cred.client_id,
                    cred.extracted_at.format("%Y-%m-%d %H:%M")
                ),
                Err(e) => println!("Credentials: missing ({})", e),
            }

            match state_store.load()? {
                Some(state) => {
                    println!("Synced:      {} documents", state.synced_ids.len());
                    match state.last_run_at {
                        Some(ts) => println!("Last run:    {}", ts.format("%Y-%m-%d %H:%M")),
                        None => println!("Last run:    never"),
                    }
                }
                None => {
                    println!("Synced:      0 documents");
                    println!("Last run:    never");
                }
            }

            if let Some(url) = webhook {
                let client = WebhookClient::new(url)?;
                if client.probe() {
                    println!("Webhook:     reachable");
                } else {
                    println!("Webhook:     NOT reachable");
                }
            }
        }
    }

    Ok(())
}

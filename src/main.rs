//! usersync - org-scoped Datadog user lifecycle batch processor
//!
//! CLI entry point for applying uploaded CSV batches and reporting pending
//! invitations.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;

use dd_user_sync::core::report::render_pending_report;
use dd_user_sync::{Result, Settings, SyncError, UserAction, UserSync};

#[derive(Parser)]
#[command(name = "usersync", version, about = "Datadog user lifecycle batch processor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a CSV batch; the action is selected by the filename pattern
    Sync {
        /// Path to the uploaded CSV file
        file: PathBuf,
        /// Override the action selected by the filename pattern
        #[arg(long, value_enum)]
        action: Option<UserAction>,
    },
    /// Report users whose invitations are still pending, per organization
    Pending,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Initialize logging system
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;

    #[cfg(feature = "aws")]
    let sync = UserSync::new(settings).await?;
    #[cfg(not(feature = "aws"))]
    let sync = UserSync::with_store(
        settings,
        std::sync::Arc::new(dd_user_sync::core::secrets::EnvSecretStore),
    );

    match cli.command {
        Command::Sync { file, action } => {
            let body = std::fs::read(&file)?;
            let key = file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string();

            let action = action.or_else(|| UserAction::from_object_key(&key)).ok_or_else(|| {
                SyncError::Config(format!(
                    "Cannot infer action from '{}'; pass --action invite|disable",
                    key
                ))
            })?;

            // Partial failure is an accepted, reported outcome, not an error
            sync.process_batch(action, &body).await?;
            Ok(())
        }
        Command::Pending => {
            let report = sync.pending_report().await?;
            print!("{}", render_pending_report(&report));
            Ok(())
        }
    }
}

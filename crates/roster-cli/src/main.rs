// SPDX-License-Identifier: AGPL-3.0
// Roster CLI - Main entry point
//
// Terminal frontend: each invocation activates one view, runs one command
// and exits.

mod commands;
mod state;

use clap::Parser;
use state::AppState;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "roster", version, about = "Manage a player roster and your favorite players")]
struct Cli {
    /// Player API base URL for this run (overrides settings)
    #[arg(long, env = "ROSTER_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Directory holding settings.json and favorites.json
    #[arg(long, env = "ROSTER_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roster_cli=info".parse().unwrap())
                .add_directive("roster_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!("Starting Roster CLI v{}", env!("CARGO_PKG_VERSION"));

    let state = match AppState::new(cli.config_dir, cli.base_url) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = commands::run(&state, cli.command).await;
    state.reconciler.deactivate();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

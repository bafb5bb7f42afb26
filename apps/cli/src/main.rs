//! # posflow
//!
//! Command-line front end over the Posflow client context.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  argv ──► clap ──► ClientConfig::load ──► PosClient ──► command         │
//! │                     (file + POSFLOW_*)        │                         │
//! │                                               ▼                         │
//! │                                   latency recorded into metrics         │
//! │                                               │                         │
//! │                                   --metrics? ──► summary                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use posflow_client::{ClientConfig, PosClient};

#[derive(Parser)]
#[command(name = "posflow")]
#[command(about = "Point-of-sale client: checkout, shifts and catalog against the Posflow backend")]
#[command(version)]
struct Cli {
    /// Path to posflow.toml (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the latency summary recorded during this run
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a bearer token (and optionally the user record)
    Login {
        #[arg(long)]
        token: String,
        /// User record as JSON, e.g. '{"id":"u1","name":"Amina","role":"cashier"}'
        #[arg(long)]
        user: Option<String>,
    },
    /// Forget the token, user and cached catalog
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List products through the cache
    Products {
        /// Skip both cache tiers
        #[arg(long)]
        refresh: bool,
    },
    /// Shift clock operations
    Shift {
        #[command(subcommand)]
        action: ShiftAction,
    },
    /// Complete a sale from a cart file
    Sale {
        /// JSON cart: {"items": [...], "tax": 10, "discount": 20, ...}
        #[arg(long)]
        file: PathBuf,
    },
    /// Business-wide and today's figures
    Stats,
    /// Client configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ShiftAction {
    /// Show the open shift
    Current,
    /// Open a shift
    ClockIn,
    /// Close a shift
    ClockOut {
        #[arg(long)]
        shift_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::load(cli.config.clone()).context("loading configuration")?;
    debug!(base_url = %config.api.base_url, "Configuration loaded");

    // Config commands must work even when the config cannot build a client.
    let command = match cli.command {
        Command::Config { action } => return run_config(action, &config, cli.config),
        other => other,
    };

    let client = PosClient::new(config).context("initializing client")?;

    let outcome = match command {
        Command::Login { token, user } => commands::auth::login(&client, &token, user.as_deref()),
        Command::Logout => commands::auth::logout(&client),
        Command::Whoami => commands::auth::whoami(&client),
        Command::Products { refresh } => commands::catalog::list(&client, refresh).await,
        Command::Shift { action } => match action {
            ShiftAction::Current => commands::shift::current(&client).await,
            ShiftAction::ClockIn => commands::shift::clock_in(&client).await,
            ShiftAction::ClockOut { shift_id } => {
                commands::shift::clock_out(&client, shift_id.as_deref()).await
            }
        },
        Command::Sale { file } => commands::sale::complete(&client, &file).await,
        Command::Stats => commands::stats::show(&client).await,
        Command::Config { action } => run_config(action, client.config(), cli.config),
    };

    if cli.metrics {
        commands::stats::print_metrics(&client);
    }

    outcome
}

fn run_config(action: ConfigAction, config: &ClientConfig, path: Option<PathBuf>) -> Result<()> {
    match action {
        ConfigAction::Show => commands::config::show(config),
        ConfigAction::Init => commands::config::init(config, path),
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=posflow_client=trace` - Trace the client crate only
/// - Default: INFO, DEBUG for every `posflow*` target
///
/// Logs go to stderr so command output stays pipeable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,posflow=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_clock_out_without_shift_id() {
        let cli = Cli::try_parse_from(["posflow", "shift", "clock-out"]).unwrap();
        match cli.command {
            Command::Shift {
                action: ShiftAction::ClockOut { shift_id },
            } => assert_eq!(shift_id, None),
            _ => panic!("expected shift clock-out"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["posflow", "products", "--refresh", "--metrics"]).unwrap();
        assert!(cli.metrics);
        assert!(matches!(cli.command, Command::Products { refresh: true }));
    }

    #[tokio::test]
    async fn test_config_init_runs_without_a_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posflow.toml");
        let cli = Cli::try_parse_from([
            "posflow",
            "config",
            "init",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();

        run(cli).await.unwrap();
        assert!(path.exists());
        assert!(ClientConfig::load(Some(path)).is_ok());
    }

    #[test]
    fn test_config_show_dispatch() {
        assert!(run_config(ConfigAction::Show, &ClientConfig::default(), None).is_ok());
    }
}

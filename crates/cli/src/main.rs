// ledgerx CLI - reconcile an internal ledger against a payment gateway feed

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "ledgerx")]
#[command(about = "Reconcile an internal transaction ledger against a payment gateway feed")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Config-driven reconciliation (run, validate)
    #[command(subcommand)]
    Recon(recon::ReconCommands),

    /// List the schemas that map source fields to canonical fields
    #[command(after_help = "\
Examples:
  ledgerx schemas
  ledgerx schemas --json
  ledgerx schemas --config daily.recon.toml")]
    Schemas {
        /// Include the schemas defined in this config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("LEDGERX_GIT_HASH"), ")",
        "\nengine:  ledgerx-recon ", env!("CARGO_PKG_VERSION"),
    )
}

/// Log to stderr so stdout stays clean for `--json`. `LEDGERX_LOG` takes
/// the usual filter syntax; the engine's `log` records come through the
/// subscriber's log bridge.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("LEDGERX_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    // Only fails if a global subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: ledgerx <command> [options]");
            eprintln!("       ledgerx --help for more information");
            Ok(())
        }
        Some(Commands::Recon(cmd)) => recon::cmd_recon(cmd),
        Some(Commands::Schemas { config, json }) => recon::cmd_schemas(config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

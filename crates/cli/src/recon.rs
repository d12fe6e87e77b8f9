//! `ledgerx recon`: config-driven ledger vs gateway reconciliation.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use ledgerx_recon::export::{to_json, write_csv};
use ledgerx_recon::model::{RawRecord, Side};
use ledgerx_recon::source::{load_csv_records, load_json_records};
use ledgerx_recon::summary::render_summary;
use ledgerx_recon::{ReconConfig, ReconError, ReconInput, SchemaRegistry, SourceBatch};

use crate::exit_codes::{
    EXIT_RECON_INVALID_CONFIG, EXIT_RECON_MISMATCH, EXIT_RECON_RUNTIME, EXIT_RECON_UNPROCESSABLE,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  ledgerx recon run daily.recon.toml
  ledgerx recon run daily.recon.toml --json
  ledgerx recon run daily.recon.toml --output report.json --csv report.csv
  ledgerx recon run daily.recon.toml --summary

Exit codes:
  0  every row matched
  3  discrepancies found
  4  invalid config
  5  input or output error
  6  unprocessable records, no discrepancies")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Output the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write one CSV row per discrepancy to file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print a readable digest of the issues
        #[arg(long)]
        summary: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  ledgerx recon validate daily.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output, csv, summary } => {
            cmd_recon_run(config, json, output, csv, summary)
        }
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Config-shaped failures are the user's to fix; the rest are runtime.
fn engine_err(e: ReconError) -> CliError {
    let code = match e {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) | ReconError::UnknownSchema { .. } => {
            EXIT_RECON_INVALID_CONFIG
        }
        ReconError::Parse(_) | ReconError::Io(_) => EXIT_RECON_RUNTIME,
    };
    recon_err(code, e.to_string())
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        recon_err(EXIT_RECON_RUNTIME, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    ReconConfig::from_toml(&config_str).map_err(engine_err)
}

/// Read one side's records. `.json` files go through the JSON loader,
/// everything else is treated as CSV.
fn load_records(path: &Path) -> Result<Vec<RawRecord>, CliError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read {}: {e}", path.display())))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let records = if is_json { load_json_records(&data) } else { load_csv_records(&data) };

    records.map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("{}: {e}", path.display())))
}

fn load_batch(config: &ReconConfig, side: Side, base_dir: &Path) -> Result<SourceBatch, CliError> {
    let source = config.sources.get(side);
    let file = source.file.as_deref().ok_or_else(|| {
        recon_err(EXIT_RECON_INVALID_CONFIG, format!("sources.{side}: no file configured"))
            .with_hint(format!("add `file = \"...\"` under [sources.{side}]"))
    })?;

    // Resolve file paths relative to config file's directory
    let path = base_dir.join(file);
    let records = load_records(&path)?;
    tracing::debug!(side = %side, path = %path.display(), records = records.len(), "loaded source");
    Ok(SourceBatch::new(source.schema.clone(), records))
}

fn cmd_recon_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    csv_file: Option<PathBuf>,
    show_summary: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let input = ReconInput {
        internal: load_batch(&config, Side::Internal, base_dir)?,
        gateway: load_batch(&config, Side::Gateway, base_dir)?,
    };

    let report = ledgerx_recon::run(&config, &input).map_err(engine_err)?;

    // Outputs
    if output_file.is_some() || json_output {
        let json_str = to_json(&report).map_err(engine_err)?;

        if let Some(ref path) = output_file {
            std::fs::write(path, &json_str)
                .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if json_output {
            println!("{json_str}");
        }
    }

    if let Some(ref path) = csv_file {
        let file = File::create(path)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write {}: {e}", path.display())))?;
        write_csv(&report, BufWriter::new(file)).map_err(engine_err)?;
        eprintln!("wrote {}", path.display());
    }

    if show_summary {
        // stdout belongs to --json when it's set
        if json_output {
            eprint!("{}", render_summary(&report));
        } else {
            print!("{}", render_summary(&report));
        }
    }

    // Human tally to stderr
    let s = &report.summary;
    eprintln!(
        "recon '{}': {} rows, {} matched, {} issues, {} unprocessable",
        report.meta.config_name,
        s.total,
        s.total - s.issues,
        s.issues,
        s.unprocessable,
    );

    if report.is_clean() {
        return Ok(());
    }
    if s.issues > 0 {
        return Err(recon_err(EXIT_RECON_MISMATCH, format!("{} discrepancies found", s.issues)));
    }
    Err(recon_err(
        EXIT_RECON_UNPROCESSABLE,
        format!("{} records could not be processed", s.unprocessable),
    )
    .with_hint("run with --json to see each record's side, position and error"))
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let vocabulary = config.vocabulary().map_err(engine_err)?;

    eprintln!(
        "config '{}' valid: internal={} gateway={} drift_secs={} timezone={}",
        config.name,
        config.sources.internal.schema,
        config.sources.gateway.schema,
        config.tolerance.drift_secs,
        config.normalize.default_timezone,
    );
    eprintln!(
        "statuses: {}",
        vocabulary.canonical_statuses().collect::<Vec<_>>().join(", ")
    );

    for side in [Side::Internal, Side::Gateway] {
        if let Some(file) = config.sources.get(side).file.as_deref() {
            let path = base_dir.join(file);
            if !path.is_file() {
                eprintln!("warning: sources.{side}.file {} does not exist", path.display());
            }
        }
    }
    Ok(())
}

// ============================================================================
// schemas
// ============================================================================

/// List the effective schema registry: built-ins, overlaid with a
/// config's own schemas when one is given.
pub fn cmd_schemas(config_path: Option<PathBuf>, json_output: bool) -> Result<(), CliError> {
    let registry = match config_path {
        Some(path) => load_config(&path)?.schema_registry(),
        None => SchemaRegistry::builtin(),
    };

    if json_output {
        let json = serde_json::to_string_pretty(&registry)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "{:<12} {:<16} {:<14} {:<14} {:<10} {:<14} minor_units",
        "schema", "tx_id", "amount", "currency", "status", "timestamp"
    );
    for (name, schema) in registry.iter() {
        println!(
            "{:<12} {:<16} {:<14} {:<14} {:<10} {:<14} {}",
            name,
            schema.tx_id,
            schema.amount,
            schema.currency,
            schema.status,
            schema.timestamp,
            schema.amount_minor_units,
        );
    }
    Ok(())
}

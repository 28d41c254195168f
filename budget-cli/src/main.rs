use anyhow::{Context, Result};
use budget_core::SheetRow;
use budget_reconcile::{LogObserver, SyncOptions, run_sync};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod google_sheets;
mod paths;
mod simplefin;

use google_sheets::GoogleSheetsClient;
use simplefin::SimpleFinClient;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUDGET_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "budget-import",
    version = VERSION,
    about = "Import SimpleFIN transactions into a Google Sheets budget"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch recent transactions and append the new ones to the ledger sheet
    Sync {
        /// Config file (default: ./budget.toml, then ~/.budget-import/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override simplefin.lookback_days
        #[arg(long)]
        days: Option<i64>,

        /// Print the rows that would be appended as CSV; write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config (never overwrites)
    Init {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load and validate the config without contacting any service
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Sync { config, days, dry_run } => sync(config, days, dry_run).await?,

        Command::Config { command } => match command {
            ConfigCommand::Init { config } => {
                let path = paths::resolve_config_path(config)?;
                if config::init_config(&path)? {
                    println!("Wrote default config to {}", path.display());
                    println!("{}", config::YAML_MIGRATION_NOTE);
                } else {
                    println!("Config already exists at {}", path.display());
                }
            }
            ConfigCommand::Check { config } => {
                let path = paths::resolve_config_path(config)?;
                let cfg = config::load_config(&path)?;
                cfg.validate()
                    .with_context(|| format!("invalid config {}", path.display()))?;
                println!("Config OK: {}", path.display());
            }
        },
    }

    Ok(())
}

async fn sync(config: Option<PathBuf>, days: Option<i64>, dry_run: bool) -> Result<()> {
    let path = paths::resolve_config_path(config)?;
    let mut cfg = config::load_config(&path)?;
    if let Some(days) = days {
        cfg.simplefin.lookback_days = days;
    }
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;

    tracing::info!("Connecting to Google Sheets...");
    let sheets =
        GoogleSheetsClient::connect(&cfg.google.credentials, &cfg.google.spreadsheet_id).await?;
    let finance = SimpleFinClient::new(cfg.simplefin.endpoint()?)?;

    let options = SyncOptions {
        sheet_name: cfg.google.sheet_name.clone(),
        mapping_sheet: cfg.google.mapping_sheet.clone(),
        start_date: cfg.simplefin.start_date(Utc::now())?,
        dry_run,
    };

    let report = run_sync(&sheets, &finance, &options, &LogObserver).await?;

    if dry_run {
        write_rows_csv(std::io::stdout().lock(), &report.rows)?;
    }

    Ok(())
}

/// Ledger rows as CSV, with a header line.
fn write_rows_csv<W: Write>(out: W, rows: &[SheetRow]) -> Result<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(["ID", "Payee", "Amount", "Date", "Category", "Receipt"])?;
    for r in rows {
        w.write_record([
            r.id.as_str(),
            r.payee.as_str(),
            r.amount.to_string().as_str(),
            r.date.as_str(),
            r.category.as_str(),
            r.receipt.as_str(),
        ])?;
    }
    w.flush().context("flush csv")?;
    Ok(())
}

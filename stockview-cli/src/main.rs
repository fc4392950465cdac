//! Stockview CLI: chart, replay, and config commands.
//!
//! Commands:
//! - `chart`: fetch the five analytics for a query, align and print them
//! - `replay`: re-run the last successfully charted query
//! - `config`: print the effective configuration as TOML

mod export;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use stockview_core::data::HttpAnalyticsService;
use stockview_core::domain::ViewInputs;
use stockview_core::persistence::{JsonFileStore, ViewStore};
use stockview_core::session::InputPort;
use stockview_core::{
    ChartSession, NoticeBuffer, NoticeLevel, RequestOrchestrator, RunOutput, StockviewConfig,
};

#[derive(Parser)]
#[command(
    name = "stockview",
    about = "Stockview CLI: stock prices with regression, levels and moving average"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./stockview.toml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Print the run as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also write the aligned series as CSV to this file.
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, align and print analytics for one company and date range.
    Chart {
        /// Ticker symbol (e.g., ACME).
        #[arg(long)]
        company: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Moving-average window in trading days.
        #[arg(long)]
        period: String,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Re-run the last successfully charted query.
    Replay {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = StockviewConfig::discover(cli.config.as_deref())?;
    init_tracing(&config.logging.filter);

    match cli.command {
        Commands::Chart {
            company,
            start,
            end,
            period,
            output,
        } => {
            let end = end.unwrap_or_else(|| {
                chrono::Local::now()
                    .date_naive()
                    .format(stockview_core::domain::DATE_FORMAT)
                    .to_string()
            });
            let inputs = ViewInputs::new(company, start, end, period);
            run_chart(&config, &inputs, &output)
        }
        Commands::Replay { output } => {
            let store = JsonFileStore::new(config.storage.resolved_state_path());
            match store.load() {
                Some(inputs) => run_chart(&config, &inputs, &output),
                None => bail!(
                    "no saved view at {}; run `stockview chart` first",
                    store.path().display()
                ),
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays clean for tables and JSON.
fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn run_chart(config: &StockviewConfig, input: &impl InputPort, output: &OutputArgs) -> Result<()> {
    let service = HttpAnalyticsService::from_config(&config.service)?;
    let orchestrator = RequestOrchestrator::new(Arc::new(service), config.pipeline.issue)?;
    let store = JsonFileStore::new(config.storage.resolved_state_path());
    let mut session = ChartSession::new(orchestrator, store, NoticeBuffer::new());

    let run = execute(&mut session, input);
    for notice in session.notifier_mut().drain() {
        match notice.level {
            NoticeLevel::Info => tracing::info!("{}", notice.message),
            NoticeLevel::Warning => tracing::warn!("{}", notice.message),
            NoticeLevel::Error => eprintln!("Error: {}", notice.message),
        }
    }
    let Some(run) = run else {
        std::process::exit(1);
    };

    if output.json {
        println!("{}", export::to_json(&run)?);
    } else {
        export::print_summary(&run);
    }

    if let Some(path) = &output.csv {
        std::fs::write(path, export::to_csv(&run)?)
            .with_context(|| format!("cannot write {}", path.display()))?;
        eprintln!("Wrote {} rows to {}", run.series.len(), path.display());
    }
    Ok(())
}

/// Run once through the session so the view is saved exactly as the TUI
/// would save it, keeping the output for export.
fn execute(
    session: &mut ChartSession<JsonFileStore, NoticeBuffer>,
    input: &impl InputPort,
) -> Option<RunOutput> {
    let ticket = session.begin(input).ok()?;
    let result = session.orchestrator().execute(&ticket);
    let kept = result.as_ref().ok().cloned();
    session.complete(ticket.generation(), result).ok()?;
    kept
}

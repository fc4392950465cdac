//! Stockview TUI: query form, live analytics chart, status bar.
//!
//! Panels:
//! 1. Query: company, start date, end date, moving-average period
//! 2. Chart: closing price, regression trend, support/resistance levels,
//!    moving average; zoom and pan survive re-runs
//!
//! The last successfully charted query is replayed on startup.

mod app;
mod input;
mod theme;
mod ui;
mod worker;

#[cfg(test)]
mod test_helpers;

use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use stockview_core::config::LoggingConfig;
use stockview_core::data::HttpAnalyticsService;
use stockview_core::persistence::{JsonFileStore, ViewStore};
use stockview_core::{ChartSession, NoticeBuffer, RequestOrchestrator, StockviewConfig};

use crate::app::AppState;

/// Config path override; otherwise `stockview.toml` in the working directory.
const CONFIG_ENV: &str = "STOCKVIEW_CONFIG";

fn main() -> Result<()> {
    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = StockviewConfig::discover(config_path.as_deref())?;

    // Keep the guard alive for the whole run so buffered lines get flushed.
    let _log_guard = init_tracing(&config.logging)?;
    tracing::info!(base_url = %config.service.base_url, "stockview tui starting");

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let service = HttpAnalyticsService::from_config(&config.service)?;
    let orchestrator = RequestOrchestrator::new(Arc::new(service), config.pipeline.issue)?;
    let store = JsonFileStore::new(config.storage.resolved_state_path());
    let session = ChartSession::new(orchestrator, store, NoticeBuffer::new());

    let mut app = AppState::new(session);
    if !app.restore() {
        app.set_status("Enter a query and press Enter");
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if app.in_flight > 0 {
        tracing::info!(in_flight = app.in_flight, "exiting with runs still in flight");
    }
    result
}

fn run_app<S: ViewStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState<S>,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain run results (non-blocking)
        app.poll_workers();

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

/// Log to a daily-rolling file; the terminal belongs to the UI.
fn init_tracing(logging: &LoggingConfig) -> Result<WorkerGuard> {
    let dir: &Path = &logging.directory;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(dir, "stockview-tui.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&logging.filter)),
        )
        .init();

    Ok(guard)
}

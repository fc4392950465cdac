//! Top-level UI layout: query form over the chart, status bar at the bottom.

pub mod chart_panel;
pub mod form_panel;
pub mod overlays;
pub mod status_bar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};

use crate::app::{AppState, Overlay, Panel};
use crate::theme;

/// Draw the entire UI.
pub fn draw<S>(f: &mut Frame, app: &AppState<S>) {
    // Split: form strip + chart + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(f.area());

    let form_inner = panel_block(f, chunks[0], app, Panel::Form, String::new());
    form_panel::render(f, form_inner, app);

    let chart_title = app
        .session
        .chart()
        .live()
        .map(|c| format!("{}  {}", c.title(), c.subtitle()))
        .unwrap_or_default();
    let chart_inner = panel_block(f, chunks[1], app, Panel::Chart, chart_title);
    chart_panel::render(f, chart_inner, app);

    status_bar::render(f, chunks[2], app);

    if app.overlay == Overlay::ErrorHistory {
        overlays::render_error_history(f, chunks[1], app);
    }
}

/// Draw a panel border and return the inner area.
fn panel_block<S>(
    f: &mut Frame,
    area: Rect,
    app: &AppState<S>,
    panel: Panel,
    detail: String,
) -> Rect {
    let is_active = app.active_panel == panel;
    let title = if detail.is_empty() {
        format!(" {} ", panel.label())
    } else {
        format!(" {} | {} ", panel.label(), detail)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(is_active))
        .title(title)
        .title_style(theme::panel_title(is_active));

    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FormState;
    use crate::test_helpers::{acme_inputs, test_app};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::Duration;

    fn screen(buffer: &ratatui::buffer::Buffer) -> String {
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn empty_app_renders_placeholder() {
        let app = test_app();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = screen(terminal.backend().buffer());
        assert!(text.contains("Query"));
        assert!(text.contains("Enter a company"));
    }

    #[test]
    fn live_chart_shows_title_sigma_and_dates() {
        let mut app = test_app();
        app.form = FormState::from(acme_inputs());
        app.submit();
        let resp = app.worker_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        app.handle_worker_response(resp);

        let mut terminal = Terminal::new(TestBackend::new(120, 36)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = screen(terminal.backend().buffer());
        assert!(text.contains("ACME 01/02/2024 - 01/05/2024"));
        assert!(text.contains("σ = 1.41"));
        assert!(text.contains("01/02/2024"));
        assert!(text.contains("01/05/2024"));
    }

    #[test]
    fn form_shows_fetching_hint_while_run_in_flight() {
        let mut app = test_app();
        app.form = FormState::from(acme_inputs());
        app.submit();

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(screen(terminal.backend().buffer()).contains("fetching analytics"));

        let resp = app.worker_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        app.handle_worker_response(resp);
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(!screen(terminal.backend().buffer()).contains("fetching analytics"));
    }

    #[test]
    fn error_overlay_draws_over_chart() {
        let mut app = test_app();
        app.push_error(crate::app::ErrorCategory::Network, "service down".into());
        app.overlay = Overlay::ErrorHistory;
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = screen(terminal.backend().buffer());
        assert!(text.contains("Error History (1)"));
        assert!(text.contains("[NET]"));
    }
}

//! Bottom status bar: key hints, last status message.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{AppState, Panel, StatusLevel};
use crate::theme;

pub fn render<S>(f: &mut Frame, area: Rect, app: &AppState<S>) {
    let mut spans: Vec<Span> = Vec::new();

    let hints = match app.active_panel {
        Panel::Form => " Tab:next Enter:chart Esc:chart panel ^C:quit",
        Panel::Chart => " +/-:zoom \u{2190}/\u{2192}:pan 0:reset e:errors q:quit",
    };
    spans.push(Span::styled(hints, theme::muted()));
    spans.push(Span::raw(" | "));

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

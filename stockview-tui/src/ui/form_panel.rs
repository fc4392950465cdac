//! Query form: company, start date, end date, moving-average period.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{AppState, FormField, Panel};
use crate::theme;

pub fn render<S>(f: &mut Frame, area: Rect, app: &AppState<S>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let editing = app.active_panel == Panel::Form;
    for (field, column) in FormField::ALL.iter().zip(columns.iter()) {
        let focused = editing && app.form.focus == *field;
        let value = app.form.value(*field);

        let label_style = if focused { theme::accent() } else { theme::muted() };
        let value_line = if focused {
            Line::from(vec![
                Span::styled(format!(" {value}"), theme::field_focus()),
                Span::styled("_", theme::accent()),
            ])
        } else {
            Line::from(Span::styled(format!(" {value}"), theme::text()))
        };

        let lines = vec![
            Line::from(Span::styled(format!(" {}", field.label()), label_style)),
            value_line,
        ];
        f.render_widget(Paragraph::new(lines), *column);
    }

    if area.height >= 4 {
        let hint_area = Rect {
            y: area.y + area.height - 1,
            height: 1,
            ..area
        };
        let hint = if app.is_busy() {
            Span::styled(" fetching analytics...", theme::warning())
        } else {
            Span::styled(" [Enter] chart  [Tab] next field  [Esc] to chart", theme::muted())
        };
        f.render_widget(Paragraph::new(Line::from(hint)), hint_area);
    }
}

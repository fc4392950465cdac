//! Chart panel: price, regression, four levels and the moving average.
//!
//! Each layer is drawn as one dataset per contiguous run of values, so the
//! moving average's leading gap stays a gap instead of a line from zero.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};

use stockview_core::PriceChart;

use crate::app::AppState;
use crate::theme;

pub fn render<S>(f: &mut Frame, area: Rect, app: &AppState<S>) {
    match app.session.chart().live() {
        Some(chart) if !chart.is_empty() => render_chart(f, area, chart),
        _ => render_empty(f, area),
    }
}

fn render_empty(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Enter a company, date range and moving-average period above.",
            theme::muted(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to fetch and chart.",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

/// One named line segment in chart coordinates.
struct Segment {
    name: Option<&'static str>,
    style: Style,
    points: Vec<(f64, f64)>,
}

/// Segments of every layer clipped to the visible window.
fn visible_segments(chart: &PriceChart, window: std::ops::Range<usize>) -> Vec<Segment> {
    let mut out = Vec::new();
    for layer in chart.layers() {
        let style = Style::default().fg(theme::layer_color(layer.kind()));
        let mut named = false;
        for run in layer.segments() {
            let points: Vec<(f64, f64)> = run
                .into_iter()
                .filter(|(i, _)| window.contains(i))
                .map(|(i, v)| (i as f64, v))
                .collect();
            if points.is_empty() {
                continue;
            }
            out.push(Segment {
                // Legend entry only for the first visible run of a layer.
                name: (!named).then(|| layer.kind().label()),
                style,
                points,
            });
            named = true;
        }
    }
    out
}

fn render_chart(f: &mut Frame, area: Rect, chart: &PriceChart) {
    let len = chart.len();
    let window = chart.viewport().window(len);
    let segments = visible_segments(chart, window.clone());

    let (lo, hi) = chart.y_bounds(window.clone()).unwrap_or((0.0, 1.0));
    let padding = ((hi - lo).abs() * 0.05).max(0.5);
    let y_min = lo - padding;
    let y_max = hi + padding;

    let x_min = window.start as f64;
    let x_max = (window.end.saturating_sub(1) as f64).max(x_min + 1.0);

    let datasets: Vec<Dataset> = segments
        .iter()
        .map(|seg| {
            let mut ds = Dataset::default()
                .marker(symbols::Marker::Braille)
                .style(seg.style)
                .graph_type(GraphType::Line)
                .data(&seg.points);
            if let Some(name) = seg.name {
                ds = ds.name(name);
            }
            ds
        })
        .collect();

    let labels = chart.labels();
    let first = window.start;
    let last = window.end.saturating_sub(1);
    let mid = first + (last - first) / 2;
    let x_labels: Vec<Span> = [first, mid, last]
        .iter()
        .map(|&i| Span::styled(labels[i].clone(), theme::muted()))
        .collect();

    let zoom_note = match chart.viewport().width() {
        Some(w) => format!("Trading days {}-{} of {len} ({w} shown)", first + 1, last + 1),
        None => format!("Trading days ({len})"),
    };

    let widget = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title(Span::styled(zoom_note, theme::muted()))
                .style(theme::muted())
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Price", theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.2}"), theme::muted()),
                    Span::styled(format!("{:.2}", (y_min + y_max) / 2.0), theme::muted()),
                    Span::styled(format!("{y_max:.2}"), theme::muted()),
                ]),
        );

    f.render_widget(widget, area);
}

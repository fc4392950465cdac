//! Neon-on-charcoal palette and style helpers.
//!
//! - **Accent**: electric cyan (focus, highlights, closing price)
//! - **Positive**: neon green (success, support levels)
//! - **Negative**: hot pink (errors, resistance levels)
//! - **Warning**: neon orange (warnings, moving average)
//! - **Neutral**: cool purple (regression trend)
//! - **Muted**: steel blue (hints, axes, inactive borders)

use ratatui::style::{Color, Modifier, Style};

use stockview_core::LayerKind;

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT: Color = Color::White;
pub const TEXT_DIM: Color = Color::Rgb(170, 170, 170);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn text() -> Style {
    Style::default().fg(TEXT)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_DIM)
    }
}

/// Focused form field.
pub fn field_focus() -> Style {
    Style::default()
        .fg(TEXT)
        .bg(Color::Rgb(30, 40, 48))
        .add_modifier(Modifier::BOLD)
}

/// Line color per chart layer. Major levels are bright, minor ones dim.
pub fn layer_color(kind: LayerKind) -> Color {
    match kind {
        LayerKind::Price => ACCENT,
        LayerKind::Regression => NEUTRAL,
        LayerKind::MajorResistance => NEGATIVE,
        LayerKind::MinorResistance => Color::Rgb(150, 40, 100),
        LayerKind::MajorSupport => POSITIVE,
        LayerKind::MinorSupport => Color::Rgb(40, 150, 90),
        LayerKind::MovingAverage => WARNING,
    }
}

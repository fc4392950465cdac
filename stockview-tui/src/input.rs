//! Keyboard input dispatch: overlays → global keys → panel-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use stockview_core::persistence::ViewStore;

use crate::app::{AppState, FormField, Overlay, Panel};

pub fn handle_key<S: ViewStore>(app: &mut AppState<S>, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    if app.overlay == Overlay::ErrorHistory {
        handle_error_overlay(app, key);
        return;
    }

    // 2. Global keys (always available).
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
            return;
        }
        KeyCode::Enter => {
            app.submit();
            return;
        }
        KeyCode::Tab => {
            focus_next(app);
            return;
        }
        KeyCode::BackTab => {
            focus_prev(app);
            return;
        }
        _ => {}
    }

    // 3. Panel-specific keys.
    match app.active_panel {
        Panel::Form => handle_form_key(app, key),
        Panel::Chart => handle_chart_key(app, key),
    }
}

/// Tab walks the form fields, then the chart, then back to the first field.
fn focus_next<S>(app: &mut AppState<S>) {
    match app.active_panel {
        Panel::Form => match app.form.focus.next() {
            Some(field) => app.form.focus = field,
            None => app.active_panel = Panel::Chart,
        },
        Panel::Chart => {
            app.active_panel = Panel::Form;
            app.form.focus = FormField::Company;
        }
    }
}

fn focus_prev<S>(app: &mut AppState<S>) {
    match app.active_panel {
        Panel::Form => match app.form.focus.prev() {
            Some(field) => app.form.focus = field,
            None => app.active_panel = Panel::Chart,
        },
        Panel::Chart => {
            app.active_panel = Panel::Form;
            app.form.focus = FormField::Period;
        }
    }
}

fn handle_form_key<S>(app: &mut AppState<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.active_panel = Panel::Chart,
        KeyCode::Down => {
            if let Some(field) = app.form.focus.next() {
                app.form.focus = field;
            }
        }
        KeyCode::Up => {
            if let Some(field) = app.form.focus.prev() {
                app.form.focus = field;
            }
        }
        KeyCode::Backspace => app.form.pop_char(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.form.clear_focused()
        }
        KeyCode::Char(c) if !c.is_control() => app.form.push_char(c),
        _ => {}
    }
}

fn handle_chart_key<S>(app: &mut AppState<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('e') => {
            app.overlay = Overlay::ErrorHistory;
            app.error_scroll = 0;
            return;
        }
        _ => {}
    }

    let Some(len) = app.session.chart().live().map(|c| c.len()) else {
        return;
    };
    let Some(viewport) = app.session.chart_mut().viewport_mut() else {
        return;
    };
    match key.code {
        KeyCode::Char('+') | KeyCode::Char('=') => viewport.zoom_in(len),
        KeyCode::Char('-') | KeyCode::Char('_') => viewport.zoom_out(len),
        KeyCode::Left | KeyCode::Char('h') => viewport.pan_left(len),
        KeyCode::Right | KeyCode::Char('l') => viewport.pan_right(len),
        KeyCode::Char('0') | KeyCode::Home => viewport.reset(),
        _ => {}
    }
}

fn handle_error_overlay<S>(app: &mut AppState<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. Run threads report back via the channel; the
//! chart is only ever touched from this thread.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::NaiveDateTime;

use stockview_core::domain::ViewInputs;
use stockview_core::persistence::ViewStore;
use stockview_core::session::InputPort;
use stockview_core::{ChartSession, FailureKind, NoticeBuffer, NoticeLevel};

use crate::worker::{self, WorkerResponse};

/// Which panel has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Form,
    Chart,
}

impl Panel {
    pub fn label(self) -> &'static str {
        match self {
            Panel::Form => "Query",
            Panel::Chart => "Chart",
        }
    }
}

/// The four form inputs, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Company,
    StartDate,
    EndDate,
    Period,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Company,
        FormField::StartDate,
        FormField::EndDate,
        FormField::Period,
    ];

    pub fn index(self) -> usize {
        match self {
            FormField::Company => 0,
            FormField::StartDate => 1,
            FormField::EndDate => 2,
            FormField::Period => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Company => "Company",
            FormField::StartDate => "Start (YYYY-MM-DD)",
            FormField::EndDate => "End (YYYY-MM-DD)",
            FormField::Period => "MA period",
        }
    }

    /// Next field, or `None` after the last one.
    pub fn next(self) -> Option<FormField> {
        FormField::ALL.get(self.index() + 1).copied()
    }

    /// Previous field, or `None` before the first one.
    pub fn prev(self) -> Option<FormField> {
        self.index()
            .checked_sub(1)
            .and_then(|i| FormField::ALL.get(i).copied())
    }
}

/// Form contents, edited in place.
#[derive(Debug, Clone)]
pub struct FormState {
    values: [String; 4],
    pub focus: FormField,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            values: Default::default(),
            focus: FormField::Company,
        }
    }
}

impl FormState {
    pub fn value(&self, field: FormField) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.values[self.focus.index()].push(c);
    }

    pub fn pop_char(&mut self) {
        self.values[self.focus.index()].pop();
    }

    pub fn clear_focused(&mut self) {
        self.values[self.focus.index()].clear();
    }
}

impl From<ViewInputs> for FormState {
    fn from(inputs: ViewInputs) -> Self {
        Self {
            values: [
                inputs.company,
                inputs.start_date,
                inputs.end_date,
                inputs.period,
            ],
            focus: FormField::Company,
        }
    }
}

impl InputPort for FormState {
    fn read(&self) -> ViewInputs {
        ViewInputs::new(
            self.value(FormField::Company),
            self.value(FormField::StartDate),
            self.value(FormField::EndDate),
            self.value(FormField::Period),
        )
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

impl From<NoticeLevel> for StatusLevel {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Info => StatusLevel::Info,
            NoticeLevel::Warning => StatusLevel::Warning,
            NoticeLevel::Error => StatusLevel::Error,
        }
    }
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Network,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Network => "NET",
            ErrorCategory::Other => "ERR",
        }
    }
}

impl From<FailureKind> for ErrorCategory {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Input => ErrorCategory::Input,
            FailureKind::DataInsufficient | FailureKind::Inconsistent => ErrorCategory::Data,
            FailureKind::Transport => ErrorCategory::Network,
        }
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    ErrorHistory,
}

const ERROR_HISTORY_CAP: usize = 50;

/// Top-level application state.
pub struct AppState<S> {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Panel states
    pub form: FormState,
    pub session: ChartSession<S, NoticeBuffer>,

    // Run threads
    pub worker_tx: Sender<WorkerResponse>,
    pub worker_rx: Receiver<WorkerResponse>,
    pub in_flight: usize,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
}

impl<S: ViewStore> AppState<S> {
    pub fn new(session: ChartSession<S, NoticeBuffer>) -> Self {
        let (worker_tx, worker_rx) = mpsc::channel();
        Self {
            active_panel: Panel::Form,
            running: true,
            form: FormState::default(),
            session,
            worker_tx,
            worker_rx,
            in_flight: 0,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
        }
    }

    /// Validate the form and start a run on its own thread. A run already
    /// in flight keeps going but can no longer reach the chart.
    pub fn submit(&mut self) {
        let ticket = match self.session.begin(&self.form) {
            Ok(ticket) => ticket,
            Err(_) => {
                self.drain_notices(Some(ErrorCategory::Input));
                return;
            }
        };

        let company = ticket.snapshot().company().to_string();
        let orchestrator = self.session.orchestrator().clone();
        match worker::spawn_run(orchestrator, ticket, self.worker_tx.clone()) {
            Ok(_) => {
                self.in_flight += 1;
                self.set_status(format!("Fetching {company}..."));
            }
            Err(e) => self.push_error(
                ErrorCategory::Other,
                format!("Could not start run thread: {e}"),
            ),
        }
    }

    /// Fill the form from the saved view and replay it.
    pub fn restore(&mut self) -> bool {
        match self.session.saved_inputs() {
            Some(inputs) => {
                tracing::info!(company = %inputs.company, "restoring saved view");
                self.form = FormState::from(inputs);
                self.submit();
                true
            }
            None => false,
        }
    }

    pub fn handle_worker_response(&mut self, resp: WorkerResponse) {
        match resp {
            WorkerResponse::RunFinished { generation, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let category = result.as_ref().err().map(|e| ErrorCategory::from(e.kind()));
                // Failures are already reported through the notifier.
                let _ = self.session.complete(generation, result);
                self.drain_notices(category);
            }
        }
    }

    /// Drain pending worker responses without blocking.
    pub fn poll_workers(&mut self) {
        while let Ok(resp) = self.worker_rx.try_recv() {
            self.handle_worker_response(resp);
        }
    }

    fn drain_notices(&mut self, category: Option<ErrorCategory>) {
        for notice in self.session.notifier_mut().drain() {
            match notice.level {
                NoticeLevel::Error => {
                    self.push_error(category.unwrap_or(ErrorCategory::Other), notice.message)
                }
                level => self.status_message = Some((notice.message, level.into())),
            }
        }
    }
}

impl<S> AppState<S> {
    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}

//! Chart session: the orchestration boundary.
//!
//! Reads inputs through an [`InputPort`], runs the orchestrator, renders
//! through the [`ChartStateManager`], reports through a [`Notifier`] and
//! saves to a [`ViewStore`] only after a run fully succeeds.

use chrono::NaiveDate;

use crate::chart::{ChartStateManager, RenderOutcome};
use crate::domain::{RunGeneration, ViewInputs};
use crate::orchestrator::{FailureKind, PipelineError, RequestOrchestrator, RunOutput, RunTicket};
use crate::persistence::ViewStore;

/// Source of the current form values.
pub trait InputPort {
    fn read(&self) -> ViewInputs;
}

impl InputPort for ViewInputs {
    fn read(&self) -> ViewInputs {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// One user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Output port for user-visible messages.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Collects notices until the front end drains them.
#[derive(Debug, Default)]
pub struct NoticeBuffer {
    notices: Vec<Notice>,
}

impl NoticeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

impl Notifier for NoticeBuffer {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// One human-readable line for a failed run.
pub fn describe_failure(err: &PipelineError) -> String {
    let prefix = match err.kind() {
        FailureKind::Input => "Invalid input",
        FailureKind::DataInsufficient => "Not enough data",
        FailureKind::Transport => "Analytics service error",
        FailureKind::Inconsistent => "Inconsistent analytics data",
    };
    format!("{prefix}: {err}")
}

pub struct ChartSession<S, N> {
    orchestrator: RequestOrchestrator,
    chart: ChartStateManager,
    store: S,
    notifier: N,
    today: Option<NaiveDate>,
}

impl<S: ViewStore, N: Notifier> ChartSession<S, N> {
    pub fn new(orchestrator: RequestOrchestrator, store: S, notifier: N) -> Self {
        let chart = ChartStateManager::with_generations(orchestrator.generations());
        Self {
            orchestrator,
            chart,
            store,
            notifier,
            today: None,
        }
    }

    /// Pin "today" for end-date validation.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Validate the current inputs and start a run. Input errors are
    /// notified here and no request is issued.
    pub fn begin(&mut self, input: &impl InputPort) -> Result<RunTicket, PipelineError> {
        let inputs = input.read();
        match inputs.validate(self.today()) {
            Ok(snapshot) => Ok(self.orchestrator.begin(snapshot)),
            Err(e) => {
                let err = PipelineError::from(e);
                self.notifier.notify(Notice::error(describe_failure(&err)));
                Err(err)
            }
        }
    }

    /// Apply a finished run. Results of superseded runs, good or bad, are
    /// dropped silently as `Stale`.
    pub fn complete(
        &mut self,
        generation: RunGeneration,
        result: Result<RunOutput, PipelineError>,
    ) -> Result<RenderOutcome, PipelineError> {
        let output = match result {
            Ok(output) => output,
            Err(_) if !self.orchestrator.is_current(generation) => {
                tracing::debug!(%generation, "ignoring failure of superseded run");
                return Ok(RenderOutcome::Stale);
            }
            Err(e) => {
                tracing::warn!(%generation, error = %e, "run failed");
                self.notifier.notify(Notice::error(describe_failure(&e)));
                return Err(e);
            }
        };

        let outcome = self.chart.apply(&output);
        if outcome == RenderOutcome::Stale {
            return Ok(outcome);
        }

        // Canonical form: what was actually charted.
        let inputs = ViewInputs::from(output.snapshot.as_ref());
        if let Err(e) = self.store.save(&inputs) {
            tracing::warn!(error = %e, "failed to persist view");
            self.notifier
                .notify(Notice::warning(format!("Chart drawn but view not saved: {e}")));
        }
        self.notifier.notify(Notice::info(format!(
            "{}: {} trading days, σ = {}",
            output.snapshot.company(),
            output.series.len(),
            output.std_dev
        )));
        Ok(outcome)
    }

    /// Validate, run and render on the calling thread.
    pub fn submit(&mut self, input: &impl InputPort) -> Result<RenderOutcome, PipelineError> {
        let ticket = self.begin(input)?;
        let result = self.orchestrator.execute(&ticket);
        self.complete(ticket.generation(), result)
    }

    /// Replay the persisted view, if any.
    pub fn restore(&mut self) -> Option<Result<RenderOutcome, PipelineError>> {
        let inputs = self.store.load()?;
        tracing::info!(company = %inputs.company, "replaying saved view");
        Some(self.submit(&inputs))
    }

    pub fn saved_inputs(&self) -> Option<ViewInputs> {
        self.store.load()
    }
}

impl<S, N> ChartSession<S, N> {
    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    pub fn chart(&self) -> &ChartStateManager {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut ChartStateManager {
        &mut self.chart
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}

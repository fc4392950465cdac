//! Request orchestration: one snapshot, five requests, one aligned series.
//!
//! A run is split in two steps so the UI thread can own generations while a
//! background thread does the blocking I/O:
//! 1. `begin` freezes the snapshot and claims a new generation
//! 2. `execute` fetches all five results and aligns them
//!
//! Failure is all-or-nothing: the first failed request fails the whole run
//! and nothing is handed to the chart.

use std::sync::Arc;
use thiserror::Error;

use crate::config::IssueMode;
use crate::data::align::{align, AlignError};
use crate::data::provider::{AnalyticsProvider, AnalyticsRequest, Endpoint, ServiceError};
use crate::domain::{
    AlignedChartSeries, AnalyticsBundle, GenerationCounter, InputError, RunGeneration,
    RunSnapshot, StandardDeviation,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: ServiceError,
    },

    #[error(transparent)]
    Align(#[from] AlignError),

    #[error("failed to start request pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Coarse classification used for user-facing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Input,
    DataInsufficient,
    Transport,
    Inconsistent,
}

impl PipelineError {
    fn transport(endpoint: Endpoint) -> impl FnOnce(ServiceError) -> PipelineError {
        move |source| PipelineError::Transport { endpoint, source }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Input(_) => FailureKind::Input,
            PipelineError::Align(e) if e.is_recoverable_input() => FailureKind::DataInsufficient,
            PipelineError::Align(_) => FailureKind::Inconsistent,
            PipelineError::Transport { .. } | PipelineError::Pool(_) => FailureKind::Transport,
        }
    }
}

/// A started run: its generation plus the frozen inputs.
#[derive(Debug, Clone)]
pub struct RunTicket {
    generation: RunGeneration,
    snapshot: Arc<RunSnapshot>,
}

impl RunTicket {
    pub fn generation(&self) -> RunGeneration {
        self.generation
    }

    pub fn snapshot(&self) -> &RunSnapshot {
        &self.snapshot
    }
}

/// Everything a successful run hands to the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub generation: RunGeneration,
    pub snapshot: Arc<RunSnapshot>,
    pub series: AlignedChartSeries,
    pub std_dev: StandardDeviation,
}

/// Issues the five analytics requests for a snapshot and aligns the results.
///
/// Clones share the provider, the request pool and the generation counter.
#[derive(Clone)]
pub struct RequestOrchestrator {
    provider: Arc<dyn AnalyticsProvider>,
    issue: IssueMode,
    generations: GenerationCounter,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl RequestOrchestrator {
    pub fn new(provider: Arc<dyn AnalyticsProvider>, issue: IssueMode) -> Result<Self, PipelineError> {
        // Private pool: blocking HTTP calls must not occupy the global rayon pool.
        let pool = match issue {
            IssueMode::Parallel => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(Endpoint::ALL.len())
                    .thread_name(|i| format!("stockview-fetch-{i}"))
                    .build()?,
            )),
            IssueMode::Sequential => None,
        };
        Ok(Self {
            provider,
            issue,
            generations: GenerationCounter::new(),
            pool,
        })
    }

    pub fn issue_mode(&self) -> IssueMode {
        self.issue
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Handle on the shared generation counter.
    pub fn generations(&self) -> GenerationCounter {
        self.generations.clone()
    }

    pub fn is_current(&self, generation: RunGeneration) -> bool {
        self.generations.is_current(generation)
    }

    /// Freeze `snapshot` and start a new generation, superseding any run
    /// still in flight.
    pub fn begin(&self, snapshot: RunSnapshot) -> RunTicket {
        let generation = self.generations.advance();
        tracing::debug!(
            %generation,
            company = snapshot.company(),
            period = snapshot.period(),
            "run started"
        );
        RunTicket {
            generation,
            snapshot: Arc::new(snapshot),
        }
    }

    /// Fetch and align for a started run. Blocks on I/O.
    pub fn execute(&self, ticket: &RunTicket) -> Result<RunOutput, PipelineError> {
        let snapshot = ticket.snapshot();
        let bundle = self.fetch(snapshot)?;
        let series = align(
            snapshot.range().calendar(),
            &bundle.prices,
            &bundle.regression,
            &bundle.levels,
            &bundle.moving_average,
            snapshot.period(),
        )?;

        tracing::info!(
            generation = %ticket.generation,
            company = snapshot.company(),
            trading_days = series.len(),
            "run aligned"
        );

        Ok(RunOutput {
            generation: ticket.generation,
            snapshot: Arc::clone(&ticket.snapshot),
            series,
            std_dev: bundle.std_dev,
        })
    }

    /// `begin` + `execute` on the calling thread.
    pub fn run(&self, snapshot: RunSnapshot) -> Result<RunOutput, PipelineError> {
        let ticket = self.begin(snapshot);
        self.execute(&ticket)
    }

    /// Collect all five results for one snapshot. Alignment never starts on
    /// a partial set.
    pub fn fetch(&self, snapshot: &RunSnapshot) -> Result<AnalyticsBundle, PipelineError> {
        let request = AnalyticsRequest::from(snapshot);
        match &self.pool {
            Some(pool) => self.fetch_parallel(pool, &request, snapshot.period()),
            None => self.fetch_sequential(&request, snapshot.period()),
        }
    }

    fn fetch_sequential(
        &self,
        request: &AnalyticsRequest,
        period: usize,
    ) -> Result<AnalyticsBundle, PipelineError> {
        let p = self.provider.as_ref();
        Ok(AnalyticsBundle {
            prices: p
                .closing_prices(request)
                .map_err(PipelineError::transport(Endpoint::ClosingPrices))?,
            regression: p
                .regression(request)
                .map_err(PipelineError::transport(Endpoint::Regression))?,
            levels: p
                .levels(request)
                .map_err(PipelineError::transport(Endpoint::Levels))?,
            moving_average: p
                .moving_average(request, period)
                .map_err(PipelineError::transport(Endpoint::MovingAverage))?,
            std_dev: p
                .standard_deviation(request)
                .map_err(PipelineError::transport(Endpoint::StandardDeviation))?,
        })
    }

    fn fetch_parallel(
        &self,
        pool: &rayon::ThreadPool,
        request: &AnalyticsRequest,
        period: usize,
    ) -> Result<AnalyticsBundle, PipelineError> {
        let p = self.provider.as_ref();
        let ((prices, regression), (levels, (moving_average, std_dev))) = pool.install(|| {
            rayon::join(
                || rayon::join(|| p.closing_prices(request), || p.regression(request)),
                || {
                    rayon::join(
                        || p.levels(request),
                        || {
                            rayon::join(
                                || p.moving_average(request, period),
                                || p.standard_deviation(request),
                            )
                        },
                    )
                },
            )
        });

        // All five have settled; report the first failure in endpoint order.
        Ok(AnalyticsBundle {
            prices: prices.map_err(PipelineError::transport(Endpoint::ClosingPrices))?,
            regression: regression.map_err(PipelineError::transport(Endpoint::Regression))?,
            levels: levels.map_err(PipelineError::transport(Endpoint::Levels))?,
            moving_average: moving_average
                .map_err(PipelineError::transport(Endpoint::MovingAverage))?,
            std_dev: std_dev.map_err(PipelineError::transport(Endpoint::StandardDeviation))?,
        })
    }
}

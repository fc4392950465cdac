//! End-to-end pipeline tests against an in-process analytics service.
//!
//! Tests:
//! 1. ACME scenario: regression and moving average land on the right days
//! 2. Identical inputs and data produce identical output
//! 3. Any failed request leaves the chart and the saved view untouched
//! 4. Last request wins regardless of arrival order (threaded)
//! 5. Saved view replays to the same chart

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stockview_core::data::{AnalyticsProvider, AnalyticsRequest, Endpoint, ServiceError};
use stockview_core::domain::{
    ClosingPrices, LevelSet, MovingAverageSeries, RegressionModel, StandardDeviation, ViewInputs,
};
use stockview_core::persistence::{MemoryStore, ViewStore};
use stockview_core::{
    ChartSession, FailureKind, IssueMode, LayerKind, NoticeBuffer, NoticeLevel, PipelineError,
    RenderOutcome, RequestOrchestrator,
};

// ──────────────────────────────────────────────
// Fake service
// ──────────────────────────────────────────────

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[derive(Clone)]
struct Canned {
    prices: ClosingPrices,
    regression: RegressionModel,
    levels: LevelSet,
    moving_average: Vec<f64>,
    std_dev: f64,
    delay: Duration,
}

/// Serves canned results per company; can be told to fail one endpoint.
#[derive(Default)]
struct FakeService {
    companies: HashMap<String, Canned>,
    failing: Mutex<Option<Endpoint>>,
}

impl FakeService {
    fn with(mut self, company: &str, canned: Canned) -> Self {
        self.companies.insert(company.to_string(), canned);
        self
    }

    fn fail(&self, endpoint: Option<Endpoint>) {
        *self.failing.lock().unwrap() = endpoint;
    }

    fn lookup(&self, endpoint: Endpoint, r: &AnalyticsRequest) -> Result<&Canned, ServiceError> {
        if *self.failing.lock().unwrap() == Some(endpoint) {
            return Err(ServiceError::Status {
                status: 500,
                message: format!("{} unavailable", endpoint.label()),
            });
        }
        let canned = self
            .companies
            .get(&r.company)
            .ok_or_else(|| ServiceError::Status {
                status: 400,
                message: format!("unknown company {}", r.company),
            })?;
        if endpoint == Endpoint::ClosingPrices {
            std::thread::sleep(canned.delay);
        }
        Ok(canned)
    }
}

impl AnalyticsProvider for FakeService {
    fn name(&self) -> &str {
        "fake"
    }

    fn closing_prices(&self, r: &AnalyticsRequest) -> Result<ClosingPrices, ServiceError> {
        Ok(self.lookup(Endpoint::ClosingPrices, r)?.prices.clone())
    }

    fn regression(&self, r: &AnalyticsRequest) -> Result<RegressionModel, ServiceError> {
        Ok(self.lookup(Endpoint::Regression, r)?.regression)
    }

    fn levels(&self, r: &AnalyticsRequest) -> Result<LevelSet, ServiceError> {
        Ok(self.lookup(Endpoint::Levels, r)?.levels)
    }

    fn moving_average(
        &self,
        r: &AnalyticsRequest,
        _period: usize,
    ) -> Result<MovingAverageSeries, ServiceError> {
        Ok(MovingAverageSeries::new(
            self.lookup(Endpoint::MovingAverage, r)?.moving_average.clone(),
        ))
    }

    fn standard_deviation(&self, r: &AnalyticsRequest) -> Result<StandardDeviation, ServiceError> {
        Ok(StandardDeviation(self.lookup(Endpoint::StandardDeviation, r)?.std_dev))
    }
}

fn acme() -> Canned {
    Canned {
        prices: [
            (d(2024, 1, 2), 100.0),
            (d(2024, 1, 3), 102.0),
            (d(2024, 1, 4), 101.0),
            (d(2024, 1, 5), 105.0),
        ]
        .into_iter()
        .collect(),
        regression: RegressionModel::new(99.0, 1.0),
        levels: LevelSet {
            major_resistance: 105.0,
            major_support: 100.0,
            minor_resistance: 102.0,
            minor_support: 101.0,
        },
        moving_average: vec![101.0, 102.5, 103.0],
        std_dev: 1.414,
        delay: Duration::ZERO,
    }
}

fn msft(delay: Duration) -> Canned {
    Canned {
        prices: [(d(2024, 1, 2), 370.0), (d(2024, 1, 3), 371.0)]
            .into_iter()
            .collect(),
        regression: RegressionModel::new(369.0, 1.0),
        levels: LevelSet {
            major_resistance: 371.0,
            major_support: 370.0,
            minor_resistance: 371.0,
            minor_support: 370.0,
        },
        moving_average: vec![370.0, 371.0],
        std_dev: 0.5,
        delay,
    }
}

fn acme_inputs() -> ViewInputs {
    ViewInputs::new("ACME", "2024-01-02", "2024-01-05", "2")
}

fn session(
    service: Arc<FakeService>,
    issue: IssueMode,
) -> ChartSession<MemoryStore, NoticeBuffer> {
    let orch = RequestOrchestrator::new(service, issue).unwrap();
    ChartSession::new(orch, MemoryStore::new(), NoticeBuffer::new()).with_today(d(2024, 6, 1))
}

// ──────────────────────────────────────────────
// 1. ACME scenario
// ──────────────────────────────────────────────

#[test]
fn acme_scenario_end_to_end() {
    for issue in [IssueMode::Parallel, IssueMode::Sequential] {
        let service = Arc::new(FakeService::default().with("ACME", acme()));
        let mut s = session(service, issue);

        assert_eq!(s.submit(&acme_inputs()).unwrap(), RenderOutcome::Constructed);

        let chart = s.chart().live().unwrap();
        assert_eq!(
            chart.labels(),
            &["01/02/2024", "01/03/2024", "01/04/2024", "01/05/2024"]
        );
        let price = chart.layer(LayerKind::Price).unwrap().values();
        assert_eq!(
            price,
            &[Some(100.0), Some(102.0), Some(101.0), Some(105.0)]
        );
        let regression = chart.layer(LayerKind::Regression).unwrap().values();
        assert_eq!(
            regression,
            &[Some(100.0), Some(101.0), Some(102.0), Some(103.0)]
        );
        let ma = chart.layer(LayerKind::MovingAverage).unwrap().values();
        assert_eq!(ma, &[None, Some(101.0), Some(102.5), Some(103.0)]);
        assert_eq!(chart.subtitle(), "σ = 1.41");
    }
}

#[test]
fn prices_outside_the_range_are_ignored() {
    let mut padded = acme();
    padded.prices.insert(d(2023, 12, 29), 97.0);
    padded.prices.insert(d(2024, 1, 8), 110.0);
    let service = Arc::new(FakeService::default().with("ACME", padded));
    let mut s = session(service, IssueMode::Sequential);

    s.submit(&acme_inputs()).unwrap();
    let chart = s.chart().live().unwrap();
    assert_eq!(chart.len(), 4);
    assert_eq!(chart.labels().first().map(String::as_str), Some("01/02/2024"));
    assert_eq!(chart.labels().last().map(String::as_str), Some("01/05/2024"));
    let price = chart.layer(LayerKind::Price).unwrap().values();
    assert_eq!(
        price,
        &[Some(100.0), Some(102.0), Some(101.0), Some(105.0)]
    );
}

// ──────────────────────────────────────────────
// 2. Idempotency
// ──────────────────────────────────────────────

#[test]
fn identical_runs_produce_identical_output() {
    let service = Arc::new(FakeService::default().with("ACME", acme()));
    let orch = RequestOrchestrator::new(service, IssueMode::Parallel).unwrap();
    let snapshot = acme_inputs().validate(d(2024, 6, 1)).unwrap();

    let a = orch.run(snapshot.clone()).unwrap();
    let b = orch.run(snapshot).unwrap();
    assert_eq!(a.series, b.series);
    assert_eq!(a.std_dev, b.std_dev);
    assert!(b.generation > a.generation);
}

#[test]
fn resubmitting_same_inputs_updates_in_place() {
    let service = Arc::new(FakeService::default().with("ACME", acme()));
    let mut s = session(service, IssueMode::Parallel);

    s.submit(&acme_inputs()).unwrap();
    let first = s.chart().live().unwrap().clone();
    assert_eq!(s.submit(&acme_inputs()).unwrap(), RenderOutcome::Updated);

    let second = s.chart().live().unwrap();
    assert_eq!(second.labels(), first.labels());
    assert_eq!(second.layers(), first.layers());
    assert_eq!(second.redraws(), 2);
    assert_eq!(s.chart().constructions(), 1);
}

// ──────────────────────────────────────────────
// 3. All-or-nothing
// ──────────────────────────────────────────────

#[test]
fn any_failed_request_leaves_chart_unchanged() {
    for issue in [IssueMode::Parallel, IssueMode::Sequential] {
        for endpoint in Endpoint::ALL {
            let service = Arc::new(
                FakeService::default()
                    .with("ACME", acme())
                    .with("MSFT", msft(Duration::ZERO)),
            );
            let mut s = session(service.clone(), issue);
            s.submit(&acme_inputs()).unwrap();
            let before = s.chart().live().unwrap().clone();
            s.notifier_mut().drain();

            service.fail(Some(endpoint));
            let err = s
                .submit(&ViewInputs::new("MSFT", "2024-01-02", "2024-01-03", "1"))
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Transport);
            assert!(
                matches!(err, PipelineError::Transport { endpoint: e, .. } if e == endpoint),
                "{issue:?} {endpoint}: {err}"
            );

            assert_eq!(s.chart().live().unwrap(), &before);
            assert_eq!(s.saved_inputs(), Some(acme_inputs()));

            let notices = s.notifier_mut().drain();
            assert_eq!(notices.len(), 1, "exactly one message per failure");
            assert_eq!(notices[0].level, NoticeLevel::Error);
        }
    }
}

#[test]
fn period_longer_than_trading_days_is_rejected_before_render() {
    let service = Arc::new(FakeService::default().with("ACME", acme()));
    let mut s = session(service, IssueMode::Sequential);

    let err = s
        .submit(&ViewInputs::new("ACME", "2024-01-02", "2024-01-05", "5"))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::DataInsufficient);
    assert!(!s.chart().is_live());
    assert!(s.saved_inputs().is_none());
}

#[test]
fn moving_average_length_mismatch_fails_the_run() {
    let mut broken = acme();
    broken.moving_average.pop();
    let service = Arc::new(FakeService::default().with("ACME", broken));
    let mut s = session(service, IssueMode::Parallel);

    let err = s.submit(&acme_inputs()).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Inconsistent);
    assert!(!s.chart().is_live());
}

// ──────────────────────────────────────────────
// 4. Last request wins
// ──────────────────────────────────────────────

#[test]
fn second_run_wins_when_first_arrives_last() {
    let service = Arc::new(
        FakeService::default()
            .with("ACME", acme())
            .with("MSFT", msft(Duration::from_millis(200))),
    );
    // Each run thread issues its own requests; no shared pool to queue behind.
    let mut s = session(service, IssueMode::Sequential);

    // First run is slow, second is fast.
    let slow = s
        .begin(&ViewInputs::new("MSFT", "2024-01-02", "2024-01-03", "1"))
        .unwrap();
    let fast = s.begin(&acme_inputs()).unwrap();

    let (tx, rx) = mpsc::channel();
    for ticket in [slow.clone(), fast.clone()] {
        let orch = s.orchestrator().clone();
        let tx = tx.clone();
        std::thread::spawn(move || {
            let result = orch.execute(&ticket);
            tx.send((ticket.generation(), result)).unwrap();
        });
    }
    drop(tx);

    let mut arrivals = Vec::new();
    for (generation, result) in rx {
        arrivals.push(generation);
        s.complete(generation, result).unwrap();
    }
    assert_eq!(arrivals, vec![fast.generation(), slow.generation()]);

    let chart = s.chart().live().unwrap();
    assert!(chart.title().starts_with("ACME"));
    assert_eq!(chart.generation(), Some(fast.generation()));
    assert_eq!(s.saved_inputs(), Some(acme_inputs()));
}

#[test]
fn second_run_wins_when_first_arrives_first() {
    let service = Arc::new(
        FakeService::default()
            .with("ACME", acme())
            .with("MSFT", msft(Duration::ZERO)),
    );
    let mut s = session(service, IssueMode::Sequential);

    let first = s
        .begin(&ViewInputs::new("MSFT", "2024-01-02", "2024-01-03", "1"))
        .unwrap();
    let second = s.begin(&acme_inputs()).unwrap();

    let early = s.orchestrator().execute(&first);
    assert_eq!(
        s.complete(first.generation(), early).unwrap(),
        RenderOutcome::Stale
    );
    assert!(!s.chart().is_live());
    assert!(s.saved_inputs().is_none());

    let late = s.orchestrator().execute(&second);
    assert_eq!(
        s.complete(second.generation(), late).unwrap(),
        RenderOutcome::Constructed
    );
}

// ──────────────────────────────────────────────
// 5. Persistence replay
// ──────────────────────────────────────────────

#[test]
fn saved_view_replays_identically() {
    let service = Arc::new(FakeService::default().with("ACME", acme()));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("view.json");

    let orch = RequestOrchestrator::new(service.clone(), IssueMode::Parallel).unwrap();
    let mut first = ChartSession::new(
        orch,
        stockview_core::persistence::JsonFileStore::new(&path),
        NoticeBuffer::new(),
    )
    .with_today(d(2024, 6, 1));
    first
        .submit(&ViewInputs::new(" acme", "2024-01-02", "2024-01-05", "2"))
        .unwrap();
    let drawn = first.chart().live().unwrap().clone();

    // Fresh process: new session over the same file.
    let orch = RequestOrchestrator::new(service, IssueMode::Parallel).unwrap();
    let store = stockview_core::persistence::JsonFileStore::new(&path);
    assert_eq!(store.load(), Some(acme_inputs()));
    let mut second = ChartSession::new(orch, store, NoticeBuffer::new()).with_today(d(2024, 6, 1));

    assert_eq!(
        second.restore().unwrap().unwrap(),
        RenderOutcome::Constructed
    );
    let replayed = second.chart().live().unwrap();
    assert_eq!(replayed.labels(), drawn.labels());
    assert_eq!(replayed.layers(), drawn.layers());
    assert_eq!(replayed.subtitle(), drawn.subtitle());
}

#[test]
fn failed_run_never_overwrites_saved_view() {
    let service = Arc::new(FakeService::default().with("ACME", acme()));
    let orch = RequestOrchestrator::new(service, IssueMode::Sequential).unwrap();
    let store = MemoryStore::with(acme_inputs());
    let mut s = ChartSession::new(orch, store, NoticeBuffer::new()).with_today(d(2024, 6, 1));

    // Unknown company → 400 from the service.
    assert!(s
        .submit(&ViewInputs::new("NOPE", "2024-01-02", "2024-01-05", "2"))
        .is_err());
    assert_eq!(s.saved_inputs(), Some(acme_inputs()));
}

//! Test helpers: an in-memory analytics service and a ready-made app.

use std::sync::Arc;

use chrono::NaiveDate;

use stockview_core::data::{AnalyticsProvider, AnalyticsRequest, ServiceError};
use stockview_core::domain::{
    ClosingPrices, LevelSet, MovingAverageSeries, RegressionModel, StandardDeviation, ViewInputs,
};
use stockview_core::persistence::MemoryStore;
use stockview_core::{ChartSession, IssueMode, NoticeBuffer, RequestOrchestrator};

use crate::app::AppState;

/// Answers every company with the same four-day ACME data.
pub struct AcmeService;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

impl AnalyticsProvider for AcmeService {
    fn name(&self) -> &str {
        "acme-fixture"
    }

    fn closing_prices(&self, _: &AnalyticsRequest) -> Result<ClosingPrices, ServiceError> {
        Ok([(d(2), 100.0), (d(3), 102.0), (d(4), 103.0), (d(5), 103.0)]
            .into_iter()
            .collect())
    }

    fn regression(&self, _: &AnalyticsRequest) -> Result<RegressionModel, ServiceError> {
        Ok(RegressionModel::new(99.0, 1.0))
    }

    fn levels(&self, _: &AnalyticsRequest) -> Result<LevelSet, ServiceError> {
        Ok(LevelSet {
            major_resistance: 103.0,
            major_support: 100.0,
            minor_resistance: 103.0,
            minor_support: 102.0,
        })
    }

    fn moving_average(
        &self,
        _: &AnalyticsRequest,
        period: usize,
    ) -> Result<MovingAverageSeries, ServiceError> {
        Ok(MovingAverageSeries::new(vec![102.0; (4usize + 1).saturating_sub(period)]))
    }

    fn standard_deviation(&self, _: &AnalyticsRequest) -> Result<StandardDeviation, ServiceError> {
        Ok(StandardDeviation(1.414))
    }
}

pub fn acme_inputs() -> ViewInputs {
    ViewInputs::new("ACME", "2024-01-02", "2024-01-05", "2")
}

pub fn fake_orchestrator() -> RequestOrchestrator {
    RequestOrchestrator::new(Arc::new(AcmeService), IssueMode::Sequential)
        .expect("sequential orchestrator needs no pool")
}

pub fn test_app() -> AppState<MemoryStore> {
    let session = ChartSession::new(fake_orchestrator(), MemoryStore::new(), NoticeBuffer::new())
        .with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    AppState::new(session)
}

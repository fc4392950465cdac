//! Analytics provider trait and structured error types.
//!
//! The AnalyticsProvider trait abstracts over the remote analytics service
//! so the orchestrator can run against HTTP in production and an in-memory
//! double in tests.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::domain::{
    ClosingPrices, LevelSet, MovingAverageSeries, RegressionModel, RunSnapshot,
    StandardDeviation, DATE_FORMAT,
};

/// The five analytics resources, in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ClosingPrices,
    Regression,
    Levels,
    MovingAverage,
    StandardDeviation,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::ClosingPrices,
        Endpoint::Regression,
        Endpoint::Levels,
        Endpoint::MovingAverage,
        Endpoint::StandardDeviation,
    ];

    /// Path relative to the service base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ClosingPrices => "/stockData",
            Endpoint::Regression => "/calculateLineRegression",
            Endpoint::Levels => "/calculateResistanceAndSupport",
            Endpoint::MovingAverage => "/calculateMovingAverage",
            Endpoint::StandardDeviation => "/calculateStandardDeviation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Endpoint::ClosingPrices => "closing prices",
            Endpoint::Regression => "regression",
            Endpoint::Levels => "resistance/support",
            Endpoint::MovingAverage => "moving average",
            Endpoint::StandardDeviation => "standard deviation",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Common request envelope shared by all five endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRequest {
    pub company: String,
    pub start_date: String,
    pub end_date: String,
}

impl From<&RunSnapshot> for AnalyticsRequest {
    fn from(snapshot: &RunSnapshot) -> Self {
        let range = snapshot.range();
        Self {
            company: snapshot.company().to_string(),
            start_date: range.start().format(DATE_FORMAT).to_string(),
            end_date: range.end().format(DATE_FORMAT).to_string(),
        }
    }
}

/// Moving-average request: the common envelope plus the window length.
///
/// The service reads every field as a string, period included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovingAverageRequest<'a> {
    #[serde(flatten)]
    pub base: &'a AnalyticsRequest,
    pub period: String,
}

impl<'a> MovingAverageRequest<'a> {
    pub fn new(base: &'a AnalyticsRequest, period: usize) -> Self {
        Self {
            base,
            period: period.to_string(),
        }
    }
}

/// Structured error types for service calls.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by service (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("hard stop: analytics service is refusing requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("http client setup failed: {0}")]
    Client(String),

    #[error("service error: {0}")]
    Other(String),
}

/// Trait for analytics providers.
///
/// Each method is one request/response exchange. Implementations must not
/// cache or recompute: they report exactly what the service returned.
pub trait AnalyticsProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn closing_prices(&self, request: &AnalyticsRequest) -> Result<ClosingPrices, ServiceError>;

    fn regression(&self, request: &AnalyticsRequest) -> Result<RegressionModel, ServiceError>;

    fn levels(&self, request: &AnalyticsRequest) -> Result<LevelSet, ServiceError>;

    fn moving_average(
        &self,
        request: &AnalyticsRequest,
        period: usize,
    ) -> Result<MovingAverageSeries, ServiceError>;

    fn standard_deviation(
        &self,
        request: &AnalyticsRequest,
    ) -> Result<StandardDeviation, ServiceError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

//! Analytic results as returned by the remote service.
//!
//! Nothing here computes a statistic; these are plain carriers for numbers
//! the service already produced.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sparse daily closing prices: only trading days are present.
///
/// The mapping carries no order; the calendar walk in the aligner supplies it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClosingPrices(HashMap<NaiveDate, f64>);

impl ClosingPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, price: f64) {
        self.0.insert(date, price);
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.0.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<(NaiveDate, f64)> for ClosingPrices {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Linear trend `y = b0 + b1 * t` over the 1-based trading-day index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    pub b0: f64,
    pub b1: f64,
}

impl RegressionModel {
    pub fn new(b0: f64, b1: f64) -> Self {
        Self { b0, b1 }
    }

    /// Trend value at trading-day index `t` (1-based).
    pub fn value_at(&self, t: usize) -> f64 {
        self.b0 + self.b1 * t as f64
    }
}

/// The four horizontal support/resistance levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub major_resistance: f64,
    pub major_support: f64,
    pub minor_resistance: f64,
    pub minor_support: f64,
}

/// Compact moving-average trail: one value per completed window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovingAverageSeries(Vec<f64>);

impl MovingAverageSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for MovingAverageSeries {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardDeviation(pub f64);

impl StandardDeviation {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for StandardDeviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// All five results of one run, collected before alignment starts.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsBundle {
    pub prices: ClosingPrices,
    pub regression: RegressionModel,
    pub levels: LevelSet,
    pub moving_average: MovingAverageSeries,
    pub std_dev: StandardDeviation,
}

//! AlignedChartSeries: the pipeline's output artifact.

use chrono::NaiveDate;
use serde::Serialize;

use super::analytics::LevelSet;

/// Month/day/year, the label format shown under the chart.
pub const DISPLAY_DATE_FORMAT: &str = "%m/%d/%Y";

/// One trading day on the aligned axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedPoint {
    pub date: NaiveDate,
    /// 1-based trading-day index.
    pub t: usize,
    pub price: f64,
    pub regression: f64,
    /// `None` until the first full averaging window; a gap, not a zero.
    pub moving_average: Option<f64>,
}

impl AlignedPoint {
    pub fn display_date(&self) -> String {
        self.date.format(DISPLAY_DATE_FORMAT).to_string()
    }
}

/// Dense, ordered series of trading days plus the constant levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedChartSeries {
    points: Vec<AlignedPoint>,
    levels: LevelSet,
    period: usize,
}

impl AlignedChartSeries {
    pub(crate) fn new(points: Vec<AlignedPoint>, levels: LevelSet, period: usize) -> Self {
        Self {
            points,
            levels,
            period,
        }
    }

    pub fn points(&self) -> &[AlignedPoint] {
        &self.points
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of trading days (N).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = String> + '_ {
        self.points.iter().map(AlignedPoint::display_date)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn regression(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.regression)
    }

    pub fn moving_average(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.points.iter().map(|p| p.moving_average)
    }
}

//! Domain types for stockview

pub mod analytics;
pub mod generation;
pub mod inputs;
pub mod range;
pub mod series;

pub use analytics::{
    AnalyticsBundle, ClosingPrices, LevelSet, MovingAverageSeries, RegressionModel,
    StandardDeviation,
};
pub use generation::{GenerationCounter, RunGeneration};
pub use inputs::{InputError, RunSnapshot, ViewInputs, DATE_FORMAT};
pub use range::TimeRange;
pub use series::{AlignedChartSeries, AlignedPoint, DISPLAY_DATE_FORMAT};

//! Trading-day alignment.
//!
//! Walks the expanded calendar and keeps only the dates present in the
//! sparse price mapping. Each kept date gets a 1-based trading-day index,
//! the regression is evaluated at that index, and the compact moving-average
//! trail is shifted right by `period - 1` so it lines up with the day that
//! completes each window. Leading entries are absent, never zero.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{
    AlignedChartSeries, AlignedPoint, ClosingPrices, LevelSet, MovingAverageSeries,
    RegressionModel,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error(
        "period {period} exceeds the {trading_days} trading days available in the selected range"
    )]
    DataInsufficient { period: usize, trading_days: usize },

    #[error("moving-average period must be at least 1")]
    ZeroPeriod,

    #[error(
        "moving-average series has {actual} values, expected {expected} \
         ({trading_days} trading days, period {period})"
    )]
    MovingAverageLength {
        actual: usize,
        expected: usize,
        trading_days: usize,
        period: usize,
    },
}

impl AlignError {
    /// True when the user can fix this by choosing a shorter period or a
    /// wider range.
    pub fn is_recoverable_input(&self) -> bool {
        matches!(self, AlignError::DataInsufficient { .. })
    }
}

/// Align the fetched analytics onto the trading days of `calendar`.
///
/// Price keys outside the calendar are ignored. Fails without producing any
/// partial output when `period` exceeds the number of trading days or the
/// moving-average length disagrees with it.
pub fn align<I>(
    calendar: I,
    prices: &ClosingPrices,
    regression: &RegressionModel,
    levels: &LevelSet,
    moving_average: &MovingAverageSeries,
    period: usize,
) -> Result<AlignedChartSeries, AlignError>
where
    I: IntoIterator<Item = NaiveDate>,
{
    if period == 0 {
        return Err(AlignError::ZeroPeriod);
    }

    let trading_days: Vec<(NaiveDate, f64)> = calendar
        .into_iter()
        .filter_map(|date| prices.get(date).map(|price| (date, price)))
        .collect();

    let n = trading_days.len();
    if period > n {
        return Err(AlignError::DataInsufficient {
            period,
            trading_days: n,
        });
    }

    let expected = n - period + 1;
    if moving_average.len() != expected {
        return Err(AlignError::MovingAverageLength {
            actual: moving_average.len(),
            expected,
            trading_days: n,
            period,
        });
    }

    let offset = period - 1;
    let ma = moving_average.values();
    let points = trading_days
        .into_iter()
        .enumerate()
        .map(|(i, (date, price))| {
            let t = i + 1;
            AlignedPoint {
                date,
                t,
                price,
                regression: regression.value_at(t),
                moving_average: i.checked_sub(offset).map(|k| ma[k]),
            }
        })
        .collect();

    Ok(AlignedChartSeries::new(points, *levels, period))
}

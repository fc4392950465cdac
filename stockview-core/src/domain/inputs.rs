//! Form inputs and the validated, immutable run snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::range::TimeRange;

/// ISO calendar-date format used on the wire and in persisted state.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The four raw values entered in the form, kept as text.
///
/// This is also the persisted shape, so restoring a view replays exactly
/// what was last submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewInputs {
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    pub period: String,
}

/// Problems with user input, caught before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("company symbol is required")]
    MissingCompany,

    #[error("invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("please enter a valid positive integer period (got '{0}')")]
    InvalidPeriod(String),

    #[error("start date {start} cannot be later than end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("end date {end} is in the future (today is {today})")]
    EndInFuture { end: NaiveDate, today: NaiveDate },
}

impl ViewInputs {
    pub fn new(
        company: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            period: period.into(),
        }
    }

    /// Validate the raw inputs against `today` and freeze them into a snapshot.
    pub fn validate(&self, today: NaiveDate) -> Result<RunSnapshot, InputError> {
        let period = parse_period(&self.period)?;
        let start = parse_date("start date", &self.start_date)?;
        let end = parse_date("end date", &self.end_date)?;
        let range = TimeRange::new(start, end)?;
        if end > today {
            return Err(InputError::EndInFuture { end, today });
        }
        RunSnapshot::new(&self.company, range, period)
    }
}

impl From<&RunSnapshot> for ViewInputs {
    fn from(snapshot: &RunSnapshot) -> Self {
        Self {
            company: snapshot.company.clone(),
            start_date: snapshot.range.start().format(DATE_FORMAT).to_string(),
            end_date: snapshot.range.end().format(DATE_FORMAT).to_string(),
            period: snapshot.period.to_string(),
        }
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| InputError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn parse_period(value: &str) -> Result<usize, InputError> {
    match value.trim().parse::<usize>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(InputError::InvalidPeriod(value.to_string())),
    }
}

/// Immutable parameters of one pipeline run.
///
/// Every request of a run reads from the same snapshot; nothing downstream
/// goes back to the form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RunSnapshot {
    company: String,
    range: TimeRange,
    period: usize,
}

impl RunSnapshot {
    /// Company is trimmed and upper-cased; period must be at least 1.
    pub fn new(company: &str, range: TimeRange, period: usize) -> Result<Self, InputError> {
        let company = company.trim().to_uppercase();
        if company.is_empty() {
            return Err(InputError::MissingCompany);
        }
        if period == 0 {
            return Err(InputError::InvalidPeriod(period.to_string()));
        }
        Ok(Self {
            company,
            range,
            period,
        })
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

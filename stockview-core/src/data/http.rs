//! HTTP analytics provider.
//!
//! POSTs the JSON request envelope to each of the five service endpoints and
//! decodes the wrapped JSON responses. Handles retries with exponential
//! backoff, error bodies, and the circuit breaker.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{
    AnalyticsProvider, AnalyticsRequest, Endpoint, MovingAverageRequest, ServiceError,
};
use crate::config::ServiceConfig;
use crate::domain::{
    ClosingPrices, LevelSet, MovingAverageSeries, RegressionModel, StandardDeviation,
    DATE_FORMAT,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClosingPricesBody {
    closing_prices: HashMap<String, f64>,
}

/// The service also echoes the price array it fitted; only the
/// coefficients are read.
#[derive(Debug, Deserialize)]
struct RegressionBody {
    b0: f64,
    b1: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelsBody {
    resistance_and_support: LevelsWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LevelsWire {
    major_resistance: f64,
    major_support: f64,
    minor_resistance: f64,
    minor_support: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovingAverageBody {
    moving_average: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StandardDeviationBody {
    standard_deviation: f64,
}

/// `{"error": "..."}` sent alongside 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Analytics service reached over HTTP.
pub struct HttpAnalyticsService {
    client: reqwest::blocking::Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpAnalyticsService {
    pub fn new(
        config: &ServiceConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServiceError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            circuit_breaker,
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
        })
    }

    /// Build a provider with its own breaker from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let breaker = CircuitBreaker::new(
            config.breaker_cooldown(),
            config.breaker_failure_threshold,
        );
        Self::new(config, Arc::new(breaker))
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// POST `body` to `endpoint` with retry and circuit breaker logic.
    fn post<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if !self.circuit_breaker.is_allowed() {
            return Err(ServiceError::CircuitBreakerTripped);
        }

        let url = self.endpoint_url(endpoint);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                tracing::warn!(%endpoint, attempt, ?delay, "retrying request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(ServiceError::CircuitBreakerTripped);
            }

            tracing::debug!(%endpoint, %url, attempt, "sending request");
            match self.client.post(&url).json(body).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(ServiceError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(ServiceError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status.is_server_error() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(status_error(status, resp));
                        continue;
                    }

                    // 4xx: the request itself is wrong, retrying will not help
                    if !status.is_success() {
                        return Err(status_error(status, resp));
                    }

                    let text = resp
                        .text()
                        .map_err(|e| ServiceError::NetworkUnreachable(e.to_string()))?;
                    let decoded = serde_json::from_str(&text).map_err(|e| {
                        ServiceError::ResponseFormatChanged(format!("{endpoint}: {e}"))
                    })?;
                    self.circuit_breaker.record_success();
                    return Ok(decoded);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(ServiceError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(ServiceError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ServiceError::Other("max retries exceeded".into())))
    }
}

/// Longest single wait between two attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Delay before retry `attempt` (1-based): `base * 2^(attempt - 1)`, capped.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Turn a non-success response into a `Status` error, preferring the
/// service's own message when it sent one.
fn status_error(status: reqwest::StatusCode, resp: reqwest::blocking::Response) -> ServiceError {
    let message = resp
        .text()
        .ok()
        .map(|body| error_message(&body))
        .unwrap_or_default();
    ServiceError::Status {
        status: status.as_u16(),
        message: if message.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            message
        },
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn decode_prices(body: ClosingPricesBody) -> Result<ClosingPrices, ServiceError> {
    body.closing_prices
        .into_iter()
        .map(|(date, price)| {
            NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .map(|d| (d, price))
                .map_err(|_| {
                    ServiceError::ResponseFormatChanged(format!(
                        "closing prices: invalid date key '{date}'"
                    ))
                })
        })
        .collect()
}

impl AnalyticsProvider for HttpAnalyticsService {
    fn name(&self) -> &str {
        "http"
    }

    fn closing_prices(&self, request: &AnalyticsRequest) -> Result<ClosingPrices, ServiceError> {
        let body: ClosingPricesBody = self.post(Endpoint::ClosingPrices, request)?;
        decode_prices(body)
    }

    fn regression(&self, request: &AnalyticsRequest) -> Result<RegressionModel, ServiceError> {
        let body: RegressionBody = self.post(Endpoint::Regression, request)?;
        Ok(RegressionModel::new(body.b0, body.b1))
    }

    fn levels(&self, request: &AnalyticsRequest) -> Result<LevelSet, ServiceError> {
        let body: LevelsBody = self.post(Endpoint::Levels, request)?;
        let w = body.resistance_and_support;
        Ok(LevelSet {
            major_resistance: w.major_resistance,
            major_support: w.major_support,
            minor_resistance: w.minor_resistance,
            minor_support: w.minor_support,
        })
    }

    fn moving_average(
        &self,
        request: &AnalyticsRequest,
        period: usize,
    ) -> Result<MovingAverageSeries, ServiceError> {
        let body: MovingAverageBody =
            self.post(Endpoint::MovingAverage, &MovingAverageRequest::new(request, period))?;
        Ok(MovingAverageSeries::new(body.moving_average))
    }

    fn standard_deviation(
        &self,
        request: &AnalyticsRequest,
    ) -> Result<StandardDeviation, ServiceError> {
        let body: StandardDeviationBody = self.post(Endpoint::StandardDeviation, request)?;
        Ok(StandardDeviation(body.standard_deviation))
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_closing_prices_wrapper() {
        let body: ClosingPricesBody = serde_json::from_str(
            r#"{"closingPrices": {"2024-01-03": 102.0, "2024-01-02": 100.5}}"#,
        )
        .unwrap();
        let prices = decode_prices(body).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(
            prices.get(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            Some(100.5)
        );
    }

    #[test]
    fn bad_date_key_is_a_format_error() {
        let body: ClosingPricesBody =
            serde_json::from_str(r#"{"closingPrices": {"Jan 2": 100.0}}"#).unwrap();
        let err = decode_prices(body).unwrap_err();
        assert!(matches!(err, ServiceError::ResponseFormatChanged(_)));
    }

    #[test]
    fn regression_ignores_echoed_prices() {
        let body: RegressionBody =
            serde_json::from_str(r#"{"b0": 99.0, "b1": 1.0, "stockPrices": [100, 102]}"#)
                .unwrap();
        assert_eq!((body.b0, body.b1), (99.0, 1.0));
    }

    #[test]
    fn decodes_pascal_case_levels() {
        let body: LevelsBody = serde_json::from_str(
            r#"{"resistanceAndSupport": {
                "MajorResistance": 105.0, "MajorSupport": 100.0,
                "MinorResistance": 102.0, "MinorSupport": 101.0}}"#,
        )
        .unwrap();
        assert_eq!(body.resistance_and_support.major_resistance, 105.0);
        assert_eq!(body.resistance_and_support.minor_support, 101.0);
    }

    #[test]
    fn decodes_moving_average_and_deviation() {
        let ma: MovingAverageBody =
            serde_json::from_str(r#"{"movingAverage": [101.0, 102.5, 103.0]}"#).unwrap();
        assert_eq!(ma.moving_average, vec![101.0, 102.5, 103.0]);
        let sd: StandardDeviationBody =
            serde_json::from_str(r#"{"standardDeviation": 2.0816}"#).unwrap();
        assert_eq!(sd.standard_deviation, 2.0816);
    }

    #[test]
    fn missing_wrapper_key_fails_to_decode() {
        assert!(serde_json::from_str::<MovingAverageBody>(r#"[1.0, 2.0]"#).is_err());
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Company symbol is required"}"#),
            "Company symbol is required"
        );
        assert_eq!(error_message("  gateway down \n"), "gateway down");
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(250));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 10), MAX_BACKOFF);
    }

    #[test]
    fn backoff_survives_huge_retry_counts() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff_delay(base, 33), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::MAX, 2), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::ZERO, 40), Duration::ZERO);
    }

    #[test]
    fn endpoint_urls_join_without_double_slash() {
        let config = ServiceConfig {
            base_url: "http://localhost:8080/".into(),
            ..ServiceConfig::default()
        };
        let service = HttpAnalyticsService::from_config(&config).unwrap();
        assert_eq!(
            service.endpoint_url(Endpoint::MovingAverage),
            "http://localhost:8080/calculateMovingAverage"
        );
        assert!(service.is_available());
    }

    #[test]
    fn unreachable_service_fails_fast_without_retries() {
        // Port 9 (discard) on localhost is closed in test environments.
        let config = ServiceConfig {
            base_url: "http://127.0.0.1:9".into(),
            max_retries: 0,
            timeout_secs: 2,
            ..ServiceConfig::default()
        };
        let service = HttpAnalyticsService::from_config(&config).unwrap();
        let request = AnalyticsRequest {
            company: "ACME".into(),
            start_date: "2024-01-02".into(),
            end_date: "2024-01-05".into(),
        };
        let err = service.standard_deviation(&request).unwrap_err();
        assert!(matches!(err, ServiceError::NetworkUnreachable(_)));
    }
}

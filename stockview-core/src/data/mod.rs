//! Calendar expansion, trading-day alignment, and the analytics service client

pub mod align;
pub mod calendar;
pub mod circuit_breaker;
pub mod http;
pub mod provider;

pub use align::{align, AlignError};
pub use calendar::{expand, CalendarDays, CalendarError};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use http::HttpAnalyticsService;
pub use provider::{
    AnalyticsProvider, AnalyticsRequest, Endpoint, MovingAverageRequest, ServiceError,
};

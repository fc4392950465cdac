//! Stockview Core: analytics fetch, trading-day alignment, chart state.
//!
//! This crate contains everything below the terminal:
//! - Domain types (inputs, run snapshots, analytics results, aligned series)
//! - Calendar expansion and trading-day alignment
//! - Analytics service port and its HTTP client (retry + circuit breaker)
//! - Request orchestration with generation-tagged runs
//! - The chart state manager (construct once, then mutate in place)
//! - Last-view persistence and the session that wires it all together

pub mod chart;
pub mod config;
pub mod data;
pub mod domain;
pub mod orchestrator;
pub mod persistence;
pub mod session;

pub use chart::{ChartStateManager, LayerKind, PriceChart, RenderOutcome, Viewport};
pub use config::{IssueMode, StockviewConfig};
pub use orchestrator::{FailureKind, PipelineError, RequestOrchestrator, RunOutput, RunTicket};
pub use session::{ChartSession, Notice, NoticeBuffer, NoticeLevel, Notifier};

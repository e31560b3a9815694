//! Mention/citation aggregation engine: merges the nightly rollup table with
//! an on-the-fly recomputation of the not-yet-rolled-up part of "today" and
//! shapes the result for the dashboard's analytics views.
//!
//! The engine is a pure read/compute pipeline — it holds no state of its own
//! and never writes to the stores.

pub mod error;
pub mod facade;
pub mod partial_day;
pub mod pipeline;
#[cfg(test)]
pub(crate) mod test_support;

pub use error::EngineError;
pub use facade::{
    AnalyticsRequest, BreakdownEntry, Engine, EntityBreakdown, Evolution, Momentum, MomentumPoint,
    Overview, PlatformOverview, TopicCell, TopicPerformance,
};
pub use pipeline::AggregateSlices;

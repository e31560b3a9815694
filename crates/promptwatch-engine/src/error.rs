use std::time::Duration;

use promptwatch_core::CoreError;
use promptwatch_db::DbError;
use thiserror::Error;

/// Failures the Query Facade surfaces to callers.
///
/// A failed partial-day recompute is deliberately absent: it degrades the
/// result to rollup-only data instead of failing the request, so it never
/// becomes an error variant.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("project {0} not found")]
    ProjectNotFound(i64),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("rollup store unavailable: {0}")]
    RollupUnavailable(#[source] DbError),
    #[error("rollup store read timed out after {0:?}")]
    RollupTimeout(Duration),
    #[error("dimension lookup unavailable: {0}")]
    DimensionUnavailable(#[source] DbError),
}

impl EngineError {
    /// Stable machine-readable code for API error envelopes.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ProjectNotFound(_) => "not_found",
            EngineError::Core(CoreError::UnsupportedPlatform(_)) => "unsupported_platform",
            EngineError::Core(_) => "bad_request",
            EngineError::RollupUnavailable(_)
            | EngineError::RollupTimeout(_)
            | EngineError::DimensionUnavailable(_) => "aggregation_unavailable",
        }
    }
}

//! Slice fetching: the settled rollup read and the partial-day recompute,
//! run concurrently and combined into one uniform row set.
//!
//! Both reads carry the store timeout, but the consequences are asymmetric.
//! The rollup store is the source of record: if that read fails or times out
//! the whole request fails. The partial-day side is best effort: on failure
//! or timeout the result degrades to settled data only and the response says
//! so.

use std::time::Duration;

use chrono::{DateTime, Utc};
use promptwatch_core::{AggRow, DateRange, DimensionFilters, RollupCutoff};
use promptwatch_db::{fetch_daily_aggregates, RollupRow};
use sqlx::PgPool;

use crate::error::EngineError;
use crate::partial_day::recompute_partial_day;

/// The combined row set for one analytics request.
#[derive(Debug, Clone)]
pub struct AggregateSlices {
    pub rows: Vec<AggRow>,
    /// True when the partial-day recompute failed and today's slice is
    /// missing from `rows`.
    pub degraded: bool,
}

/// Fetch settled rollup rows for `range` and, when the range covers the
/// current reference-timezone day, the recomputed post-cutoff slice.
///
/// # Errors
///
/// Returns [`EngineError::RollupUnavailable`] or
/// [`EngineError::RollupTimeout`] when the rollup read fails; a failed or
/// timed-out partial-day recompute only sets `degraded`.
#[allow(clippy::too_many_arguments)]
pub async fn fetch_slices(
    pool: &PgPool,
    project_id: i64,
    range: DateRange,
    filters: &DimensionFilters,
    cutoff: RollupCutoff,
    as_of: DateTime<Utc>,
    platform_whitelist: &[String],
    store_timeout: Duration,
) -> Result<AggregateSlices, EngineError> {
    let today = cutoff.local_date(as_of);
    let wants_partial = range.start() <= today && today <= range.end();

    let rollup_fut = tokio::time::timeout(
        store_timeout,
        fetch_daily_aggregates(
            pool,
            project_id,
            range.start(),
            range.end(),
            filters,
            platform_whitelist,
        ),
    );
    let partial_fut = tokio::time::timeout(store_timeout, async {
        if wants_partial {
            recompute_partial_day(pool, project_id, filters, cutoff, as_of, platform_whitelist)
                .await
                .map(Some)
        } else {
            Ok(None)
        }
    });

    let (rollup_result, partial_result) = tokio::join!(rollup_fut, partial_fut);

    let rollup_rows = match rollup_result {
        Err(_) => return Err(EngineError::RollupTimeout(store_timeout)),
        Ok(Err(err)) => return Err(EngineError::RollupUnavailable(err)),
        Ok(Ok(rows)) => rows,
    };

    let mut rows: Vec<AggRow> = rollup_rows
        .into_iter()
        .filter_map(RollupRow::into_agg_row)
        .collect();

    let mut degraded = false;
    match partial_result {
        Ok(Ok(Some(partial))) => rows.extend(partial),
        Ok(Ok(None)) => {}
        Ok(Err(err)) => {
            tracing::warn!(
                project_id,
                error = %err,
                "partial-day recompute failed, serving settled rollup data only"
            );
            degraded = true;
        }
        Err(_) => {
            tracing::warn!(
                project_id,
                timeout_ms = %store_timeout.as_millis(),
                "partial-day recompute timed out, serving settled rollup data only"
            );
            degraded = true;
        }
    }

    Ok(AggregateSlices { rows, degraded })
}

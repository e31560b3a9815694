//! Partial-day recomputation.
//!
//! The nightly rollup settles everything up to the cutoff instant; the slice
//! from today's cutoff to "now" only exists as raw events. This module
//! re-derives rollup-shaped rows for that slice so the merger can treat both
//! sources uniformly.
//!
//! Dimension filters are applied here at row level, after the prompt join —
//! the raw-event query binds only the time window, project, and platform
//! whitelist.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use promptwatch_core::{AggRow, Counts, DimensionFilters, EntityKey, RollupCutoff};
use promptwatch_db::{fetch_resolved_citations, fetch_resolved_mentions, DbError, ResolvedEventRow};
use sqlx::PgPool;

/// Group filtered events into rollup-shaped rows for `day`.
///
/// Grouping key matches the rollup table's dimension set, so the output is
/// shape-compatible with settled rows. Events whose entity pair is
/// inconsistent are skipped.
#[must_use]
pub fn group_partial_rows(
    mentions: &[ResolvedEventRow],
    citations: &[ResolvedEventRow],
    filters: &DimensionFilters,
    day: NaiveDate,
) -> Vec<AggRow> {
    type Key = (EntityKey, String, i64, i64);
    let mut grouped: HashMap<Key, Counts> = HashMap::new();

    let mut tally = |rows: &[ResolvedEventRow], as_mention: bool| {
        for row in rows {
            if !filters.matches(&row.platform, row.region_id, row.topic_id) {
                continue;
            }
            let Some(entity) = row.entity() else {
                continue;
            };
            let entry = grouped
                .entry((entity, row.platform.clone(), row.region_id, row.topic_id))
                .or_default();
            if as_mention {
                entry.mentions += 1;
            } else {
                entry.citations += 1;
            }
        }
    };
    tally(mentions, true);
    tally(citations, false);

    grouped
        .into_iter()
        .map(|((entity, platform, region_id, topic_id), counts)| AggRow {
            entity,
            platform,
            region_id,
            topic_id,
            day,
            counts,
        })
        .collect()
}

/// Recompute today's post-cutoff slice from raw events.
///
/// Returns an empty vec when `as_of` is still before today's cutoff — that
/// data belongs to yesterday's settled window. On a fresh install with no
/// rollup rows at all this still covers only the post-cutoff slice; full-day
/// coverage before the first rollup run is a documented limitation.
///
/// # Errors
///
/// Returns [`DbError`] if either event read fails.
pub async fn recompute_partial_day(
    pool: &PgPool,
    project_id: i64,
    filters: &DimensionFilters,
    cutoff: RollupCutoff,
    as_of: DateTime<Utc>,
    platform_whitelist: &[String],
) -> Result<Vec<AggRow>, DbError> {
    let Some((lower, upper)) = cutoff.partial_window(as_of) else {
        return Ok(Vec::new());
    };

    let (mentions, citations) = tokio::try_join!(
        fetch_resolved_mentions(pool, project_id, lower, upper, platform_whitelist),
        fetch_resolved_citations(pool, project_id, lower, upper, platform_whitelist),
    )?;

    Ok(group_partial_rows(
        &mentions,
        &citations,
        filters,
        cutoff.local_date(as_of),
    ))
}

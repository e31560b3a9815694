//! Per-day evolution shaping: one point per calendar day per platform,
//! zero-filled where nothing was counted.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{Counts, DateRange};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub day: NaiveDate,
    pub platform: String,
    pub mentions: i64,
    pub citations: i64,
}

/// Expand merged `(day, platform)` counts into a dense series over the full
/// range. Days with no data get explicit zero points so chart consumers
/// never have to infer gaps. Ordered by day ascending, then by the given
/// platform order.
#[must_use]
pub fn zero_filled_series(
    range: DateRange,
    platforms: &[String],
    merged: &HashMap<(NaiveDate, String), Counts>,
) -> Vec<SeriesPoint> {
    let mut points = Vec::with_capacity(
        usize::try_from(range.len_days()).unwrap_or(0) * platforms.len(),
    );
    for day in range.days() {
        for platform in platforms {
            let counts = merged
                .get(&(day, platform.clone()))
                .copied()
                .unwrap_or(Counts::ZERO);
            points.push(SeriesPoint {
                day,
                platform: platform.clone(),
                mentions: counts.mentions,
                citations: counts.citations,
            });
        }
    }
    points
}

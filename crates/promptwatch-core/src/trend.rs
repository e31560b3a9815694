//! Period-over-period trend arithmetic.
//!
//! A trend is the signed percentage-point change in share between a period
//! and the equal-length period immediately preceding it.

use chrono::Duration;

use crate::types::DateRange;

/// The equal-length period immediately preceding `range`:
/// `previous_end = start - 1 day`, `previous_start = previous_end - (end - start)`.
#[must_use]
pub fn previous_period(range: DateRange) -> DateRange {
    let len = range.end() - range.start();
    let prev_end = range.start() - Duration::days(1);
    // prev_end - len >= prev_end is impossible, so the constructor cannot fail.
    DateRange::new(prev_end - len, prev_end).unwrap_or(range)
}

/// Percentage-point delta between two shares. A missing previous period is
/// expressed by the caller as a 0.0 previous share, so a brand-new entity
/// trends at exactly its current share rather than NaN.
#[must_use]
pub fn share_trend(current_pct: f64, previous_pct: f64) -> f64 {
    current_pct - previous_pct
}

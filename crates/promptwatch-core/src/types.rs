use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::ops::AddAssign;

use crate::CoreError;

/// The tracked brand or one of its competitors, as it appears in grouping
/// keys. The brand carries no id of its own — there is exactly one per
/// project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "entity_type", content = "competitor_id", rename_all = "snake_case")]
pub enum EntityKey {
    Brand,
    Competitor(i64),
}

impl EntityKey {
    /// Rebuild a key from the `(entity_type, competitor_id)` pair stored in
    /// the event and rollup tables. Returns `None` for inconsistent pairs
    /// (a competitor row without an id, or a brand row with one).
    #[must_use]
    pub fn from_parts(entity_type: &str, competitor_id: Option<i64>) -> Option<Self> {
        match (entity_type, competitor_id) {
            ("brand", None) => Some(Self::Brand),
            ("competitor", Some(id)) => Some(Self::Competitor(id)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_brand(self) -> bool {
        matches!(self, Self::Brand)
    }

    #[must_use]
    pub fn competitor_id(self) -> Option<i64> {
        match self {
            Self::Brand => None,
            Self::Competitor(id) => Some(id),
        }
    }
}

/// Mention and citation counts for one grouping key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub mentions: i64,
    pub citations: i64,
}

impl Counts {
    pub const ZERO: Self = Self {
        mentions: 0,
        citations: 0,
    };

    #[must_use]
    pub fn new(mentions: i64, citations: i64) -> Self {
        Self {
            mentions,
            citations,
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.mentions += rhs.mentions;
        self.citations += rhs.citations;
    }
}

/// One daily-aggregate-shaped slice: either a settled rollup row or a
/// recomputed partial-day row. Both sources produce this shape so the merger
/// never needs to know which side a row came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AggRow {
    pub entity: EntityKey,
    pub platform: String,
    pub region_id: i64,
    pub topic_id: i64,
    pub day: NaiveDate,
    pub counts: Counts,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDateRange`] when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The default window when the caller gives no range: 30 days ending
    /// yesterday, so current-day data is only included on explicit request.
    #[must_use]
    pub fn default_ending_yesterday(today: NaiveDate) -> Self {
        let end = today - Duration::days(1);
        Self {
            start: end - Duration::days(29),
            end,
        }
    }

    #[must_use]
    pub fn start(self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, inclusive of both endpoints.
    #[must_use]
    pub fn len_days(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// Resolved dimension filters applied to aggregate rows. `None` means the
/// dimension is unfiltered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionFilters {
    pub platform: Option<String>,
    pub region_id: Option<i64>,
    pub topic_id: Option<i64>,
}

impl DimensionFilters {
    #[must_use]
    pub fn matches(&self, platform: &str, region_id: i64, topic_id: i64) -> bool {
        self.platform.as_deref().is_none_or(|p| p == platform)
            && self.region_id.is_none_or(|r| r == region_id)
            && self.topic_id.is_none_or(|t| t == topic_id)
    }
}

/// The rollup batch job's fixed daily cutoff, in the rollup's reference
/// timezone expressed as a UTC offset.
///
/// The settled rollup row for date D covers events up to the cutoff instant
/// of D+1; everything from today's cutoff to "now" is the partial slice the
/// recomputer owns. Before the first rollup ever runs there is no settled
/// window at all, and the recomputer still only covers the post-cutoff slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupCutoff {
    time: NaiveTime,
    utc_offset_minutes: i32,
}

impl RollupCutoff {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCutoff`] when hour/minute do not form a
    /// valid wall-clock time.
    pub fn new(hour: u32, minute: u32, utc_offset_minutes: i32) -> Result<Self, CoreError> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or(CoreError::InvalidCutoff { hour, minute })?;
        Ok(Self {
            time,
            utc_offset_minutes,
        })
    }

    /// The observed production schedule: 04:30 UTC.
    #[must_use]
    pub fn default_schedule() -> Self {
        Self {
            time: NaiveTime::from_hms_opt(4, 30, 0).unwrap_or_default(),
            utc_offset_minutes: 0,
        }
    }

    /// Calendar date of `as_of` in the rollup's reference timezone.
    #[must_use]
    pub fn local_date(self, as_of: DateTime<Utc>) -> NaiveDate {
        (as_of + Duration::minutes(i64::from(self.utc_offset_minutes))).date_naive()
    }

    /// UTC instant of the cutoff on the given reference-timezone date.
    #[must_use]
    pub fn cutoff_instant(self, day: NaiveDate) -> DateTime<Utc> {
        (day.and_time(self.time) - Duration::minutes(i64::from(self.utc_offset_minutes))).and_utc()
    }

    /// The `[cutoff(today), as_of]` window the Partial-Day Recomputer reads.
    ///
    /// Returns `None` when `as_of` is still before today's cutoff — those
    /// events belong to yesterday's settled window and must not be re-read.
    #[must_use]
    pub fn partial_window(self, as_of: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let lower = self.cutoff_instant(self.local_date(as_of));
        (as_of >= lower).then_some((lower, as_of))
    }
}

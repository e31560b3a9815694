//! The query facade: one entry point per analytics view.
//!
//! Every operation follows the same shape: resolve the caller's dimension
//! codes, fetch the combined settled-plus-partial row set, then reduce it
//! with the pure merge and shaping helpers. All operations take an explicit
//! `as_of` instant so results are reproducible and testable without a clock.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use promptwatch_core::{
    compose_breakdown, merge_rows, previous_period, share_trend, total_counts, zero_filled_series,
    AggRow, AppConfig, Counts, DateRange, DimensionFilters, EntityKey, EntityRoster, EntityShare,
    PlatformSet, RollupCutoff, SeriesPoint, UnknownPlatform,
};
use promptwatch_db::{entity_roster, get_project, list_topics, resolve_region, resolve_topic};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::EngineError;
use crate::pipeline::{fetch_slices, AggregateSlices};

/// One analytics query as the API layer hands it over. `as_of` is the
/// caller's notion of "now"; the engine never reads the wall clock itself.
#[derive(Debug, Clone)]
pub struct AnalyticsRequest {
    pub project_id: i64,
    pub range: Option<DateRange>,
    pub platform: Option<String>,
    pub region: Option<String>,
    pub topic: Option<String>,
    pub as_of: DateTime<Utc>,
}

impl AnalyticsRequest {
    #[must_use]
    pub fn new(project_id: i64, as_of: DateTime<Utc>) -> Self {
        Self {
            project_id,
            range: None,
            platform: None,
            region: None,
            topic: None,
            as_of,
        }
    }
}

/// Headline view: totals, brand share, and trend, overall and per platform.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_mentions: i64,
    pub total_citations: i64,
    pub brand_share: f64,
    pub brand_trend: f64,
    pub platforms: Vec<PlatformOverview>,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformOverview {
    pub platform: String,
    pub display_name: String,
    pub mentions: i64,
    pub citations: i64,
    pub brand_share: f64,
    pub brand_trend: f64,
}

/// Per-day, per-platform time series over the requested range.
#[derive(Debug, Clone, Serialize)]
pub struct Evolution {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub points: Vec<SeriesPoint>,
    pub degraded: bool,
}

/// Ranked share-of-voice entries with period-over-period trends.
#[derive(Debug, Clone, Serialize)]
pub struct EntityBreakdown {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_mentions: i64,
    pub entries: Vec<BreakdownEntry>,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownEntry {
    #[serde(flatten)]
    pub share: EntityShare,
    /// Percentage-point change against the preceding equal-length period.
    pub trend: f64,
}

/// Brand counts per topic and platform, zero-filled over the full grid.
#[derive(Debug, Clone, Serialize)]
pub struct TopicPerformance {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub cells: Vec<TopicCell>,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicCell {
    pub topic_id: i64,
    pub slug: String,
    pub name: String,
    pub platform: String,
    pub mentions: i64,
    pub citations: i64,
}

/// Per-platform share-of-voice with trends, for every roster entity that
/// registered in either period.
#[derive(Debug, Clone, Serialize)]
pub struct Momentum {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub entries: Vec<MomentumPoint>,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MomentumPoint {
    pub platform: String,
    #[serde(flatten)]
    pub entity: EntityKey,
    pub name: String,
    pub mentions: i64,
    pub percentage: f64,
    pub trend: f64,
}

/// The aggregation engine. Holds a read-only pool handle and the fixed
/// whitelist/cutoff configuration; no per-request state.
#[derive(Debug, Clone)]
pub struct Engine {
    pool: PgPool,
    platforms: PlatformSet,
    cutoff: RollupCutoff,
    store_timeout: Duration,
}

impl Engine {
    #[must_use]
    pub fn new(
        pool: PgPool,
        platforms: PlatformSet,
        cutoff: RollupCutoff,
        store_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            platforms,
            cutoff,
            store_timeout,
        }
    }

    #[must_use]
    pub fn from_config(pool: PgPool, platforms: PlatformSet, config: &AppConfig) -> Self {
        Self::new(
            pool,
            platforms,
            config.rollup_cutoff,
            Duration::from_secs(config.store_read_timeout_secs),
        )
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn platforms(&self) -> &PlatformSet {
        &self.platforms
    }

    /// Headline totals, brand share of voice, and trend for the range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ProjectNotFound`] for a missing project, or a
    /// store error when the rollup or dimension reads fail.
    pub async fn overview(&self, req: &AnalyticsRequest) -> Result<Overview, EngineError> {
        let (range, filters, scope) = self.resolve_request(req, UnknownPlatform::Ignore).await?;
        let roster = self.roster(req.project_id).await?;

        let previous = previous_period(range);
        let (current, prior) = tokio::try_join!(
            self.slices(req.project_id, range, &filters, req.as_of),
            self.slices(req.project_id, previous, &filters, req.as_of),
        )?;

        let current_counts = entity_counts(&current.rows, None);
        let prior_counts = entity_counts(&prior.rows, None);
        let totals = roster_totals(&current_counts, &roster);

        let platforms = scope
            .iter()
            .map(|platform| {
                let cur = entity_counts(&current.rows, Some(platform));
                let prev = entity_counts(&prior.rows, Some(platform));
                let platform_totals = roster_totals(&cur, &roster);
                PlatformOverview {
                    platform: platform.clone(),
                    display_name: self
                        .platforms
                        .display_name(platform)
                        .unwrap_or(platform)
                        .to_string(),
                    mentions: platform_totals.mentions,
                    citations: platform_totals.citations,
                    brand_share: brand_share(&cur, &roster),
                    brand_trend: share_trend(
                        brand_share(&cur, &roster),
                        brand_share(&prev, &roster),
                    ),
                }
            })
            .collect();

        Ok(Overview {
            from: range.start(),
            to: range.end(),
            total_mentions: totals.mentions,
            total_citations: totals.citations,
            brand_share: brand_share(&current_counts, &roster),
            brand_trend: share_trend(
                brand_share(&current_counts, &roster),
                brand_share(&prior_counts, &roster),
            ),
            platforms,
            degraded: current.degraded || prior.degraded,
        })
    }

    /// Dense per-day, per-platform series over the range. Counts cover every
    /// roster entity; days with no activity appear as explicit zeros.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ProjectNotFound`] for a missing project, or a
    /// store error when the rollup or dimension reads fail.
    pub async fn evolution(&self, req: &AnalyticsRequest) -> Result<Evolution, EngineError> {
        let (range, filters, scope) = self.resolve_request(req, UnknownPlatform::Ignore).await?;
        self.require_project(req.project_id).await?;

        let slices = self
            .slices(req.project_id, range, &filters, req.as_of)
            .await?;

        let merged = merge_rows(&slices.rows, |r| (r.day, r.platform.clone()));
        let points = zero_filled_series(range, &scope, &merged);

        Ok(Evolution {
            from: range.start(),
            to: range.end(),
            points,
            degraded: slices.degraded,
        })
    }

    /// Ranked share-of-voice breakdown with per-entity trends.
    ///
    /// Without an explicit platform filter the breakdown covers the primary
    /// platforms only. Unlike filter-style endpoints, an unknown platform
    /// code is rejected here: a breakdown for a platform we do not track is
    /// a caller bug, not a fallback case.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Core`] for an unsupported platform,
    /// [`EngineError::ProjectNotFound`] for a missing project, or a store
    /// error when reads fail.
    pub async fn breakdown(&self, req: &AnalyticsRequest) -> Result<EntityBreakdown, EngineError> {
        let (range, filters, _) = self.resolve_request(req, UnknownPlatform::Reject).await?;
        let roster = self.roster(req.project_id).await?;

        let previous = previous_period(range);
        let (current, prior) = tokio::try_join!(
            self.slices(req.project_id, range, &filters, req.as_of),
            self.slices(req.project_id, previous, &filters, req.as_of),
        )?;

        let allowed = match &filters.platform {
            Some(p) => vec![p.clone()],
            None => self.platforms.primary_codes(),
        };
        let shares = compose_breakdown(&platform_scoped_counts(&current.rows, &allowed), &roster);
        let prior_shares =
            compose_breakdown(&platform_scoped_counts(&prior.rows, &allowed), &roster);
        let prior_pct: HashMap<EntityKey, f64> = prior_shares
            .into_iter()
            .map(|s| (s.entity, s.percentage))
            .collect();

        let total_mentions = shares.iter().map(|s| s.mentions).sum();
        let entries = shares
            .into_iter()
            .map(|share| {
                let previous_pct = prior_pct.get(&share.entity).copied().unwrap_or(0.0);
                BreakdownEntry {
                    trend: share_trend(share.percentage, previous_pct),
                    share,
                }
            })
            .collect();

        Ok(EntityBreakdown {
            from: range.start(),
            to: range.end(),
            total_mentions,
            entries,
            degraded: current.degraded || prior.degraded,
        })
    }

    /// Brand mention/citation counts per topic and platform. Every
    /// topic-platform pair in scope gets a cell, zero where nothing was
    /// counted, ordered by topic slug then platform.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ProjectNotFound`] for a missing project, or a
    /// store error when reads fail.
    pub async fn topic_performance(
        &self,
        req: &AnalyticsRequest,
    ) -> Result<TopicPerformance, EngineError> {
        let (range, filters, scope) = self.resolve_request(req, UnknownPlatform::Ignore).await?;
        self.require_project(req.project_id).await?;

        let topics = list_topics(&self.pool, req.project_id)
            .await
            .map_err(EngineError::DimensionUnavailable)?;
        let slices = self
            .slices(req.project_id, range, &filters, req.as_of)
            .await?;

        let merged = merge_rows(
            slices.rows.iter().filter(|r| r.entity.is_brand()),
            |r| (r.topic_id, r.platform.clone()),
        );

        let mut cells = Vec::with_capacity(topics.len() * scope.len());
        for topic in &topics {
            for platform in &scope {
                let counts = merged
                    .get(&(topic.id, platform.clone()))
                    .copied()
                    .unwrap_or(Counts::ZERO);
                cells.push(TopicCell {
                    topic_id: topic.id,
                    slug: topic.slug.clone(),
                    name: topic.name.clone(),
                    platform: platform.clone(),
                    mentions: counts.mentions,
                    citations: counts.citations,
                });
            }
        }

        Ok(TopicPerformance {
            from: range.start(),
            to: range.end(),
            cells,
            degraded: slices.degraded,
        })
    }

    /// Share of voice per platform with trends, ordered by platform scope
    /// then descending share.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ProjectNotFound`] for a missing project, or a
    /// store error when reads fail.
    pub async fn momentum(&self, req: &AnalyticsRequest) -> Result<Momentum, EngineError> {
        let (range, filters, scope) = self.resolve_request(req, UnknownPlatform::Ignore).await?;
        let roster = self.roster(req.project_id).await?;

        let previous = previous_period(range);
        let (current, prior) = tokio::try_join!(
            self.slices(req.project_id, range, &filters, req.as_of),
            self.slices(req.project_id, previous, &filters, req.as_of),
        )?;

        let mut entries = Vec::new();
        for platform in &scope {
            let cur = entity_counts(&current.rows, Some(platform));
            let prev = entity_counts(&prior.rows, Some(platform));
            let shares = compose_breakdown(&cur, &roster);
            let prior_pct: HashMap<EntityKey, f64> = compose_breakdown(&prev, &roster)
                .into_iter()
                .map(|s| (s.entity, s.percentage))
                .collect();

            for share in shares {
                let previous_pct = prior_pct.get(&share.entity).copied().unwrap_or(0.0);
                entries.push(MomentumPoint {
                    platform: platform.clone(),
                    entity: share.entity,
                    name: share.name,
                    mentions: share.mentions,
                    percentage: share.percentage,
                    trend: share_trend(share.percentage, previous_pct),
                });
            }
        }

        Ok(Momentum {
            from: range.start(),
            to: range.end(),
            entries,
            degraded: current.degraded || prior.degraded,
        })
    }

    async fn resolve_request(
        &self,
        req: &AnalyticsRequest,
        on_unknown: UnknownPlatform,
    ) -> Result<(DateRange, DimensionFilters, Vec<String>), EngineError> {
        let platform = self.platforms.resolve(req.platform.as_deref(), on_unknown)?;

        let (region_id, topic_id) = tokio::try_join!(
            resolve_region(&self.pool, req.project_id, req.region.as_deref()),
            resolve_topic(&self.pool, req.project_id, req.topic.as_deref()),
        )
        .map_err(EngineError::DimensionUnavailable)?;

        let range = req
            .range
            .unwrap_or_else(|| DateRange::default_ending_yesterday(self.cutoff.local_date(req.as_of)));

        let scope = match &platform {
            Some(p) => vec![p.clone()],
            None => self.platforms.codes(),
        };
        let filters = DimensionFilters {
            platform,
            region_id,
            topic_id,
        };

        Ok((range, filters, scope))
    }

    async fn roster(&self, project_id: i64) -> Result<EntityRoster, EngineError> {
        entity_roster(&self.pool, project_id)
            .await
            .map_err(EngineError::DimensionUnavailable)?
            .ok_or(EngineError::ProjectNotFound(project_id))
    }

    async fn require_project(&self, project_id: i64) -> Result<(), EngineError> {
        get_project(&self.pool, project_id)
            .await
            .map_err(EngineError::DimensionUnavailable)?
            .ok_or(EngineError::ProjectNotFound(project_id))?;
        Ok(())
    }

    async fn slices(
        &self,
        project_id: i64,
        range: DateRange,
        filters: &DimensionFilters,
        as_of: DateTime<Utc>,
    ) -> Result<AggregateSlices, EngineError> {
        fetch_slices(
            &self.pool,
            project_id,
            range,
            filters,
            self.cutoff,
            as_of,
            &self.platforms.codes(),
            self.store_timeout,
        )
        .await
    }
}

/// Merge rows into per-entity counts, optionally restricted to one platform.
fn entity_counts(rows: &[AggRow], platform: Option<&str>) -> HashMap<EntityKey, Counts> {
    merge_rows(
        rows.iter()
            .filter(|r| platform.is_none_or(|p| r.platform == p)),
        |r| r.entity,
    )
}

/// Merge rows into per-entity counts, restricted to a platform list.
fn platform_scoped_counts(rows: &[AggRow], platforms: &[String]) -> HashMap<EntityKey, Counts> {
    merge_rows(
        rows.iter().filter(|r| platforms.contains(&r.platform)),
        |r| r.entity,
    )
}

/// Total counts over roster entities only, so deactivated competitors'
/// historical rows never inflate headline numbers.
fn roster_totals(counts: &HashMap<EntityKey, Counts>, roster: &EntityRoster) -> Counts {
    total_counts(counts.iter().filter_map(|(entity, c)| {
        let on_roster = match entity {
            EntityKey::Brand => true,
            EntityKey::Competitor(id) => roster.competitors.iter().any(|r| r.id == *id),
        };
        on_roster.then_some(c)
    }))
}

fn brand_share(counts: &HashMap<EntityKey, Counts>, roster: &EntityRoster) -> f64 {
    compose_breakdown(counts, roster)
        .into_iter()
        .find(|s| s.entity == EntityKey::Brand)
        .map_or(0.0, |s| s.percentage)
}

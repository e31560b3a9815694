//! Event store reader for the not-yet-rolled-up portion of "today".
//!
//! Raw events are joined through `responses -> prompts` exactly once here,
//! producing [`ResolvedEventRow`] with fully resolved dimensions; everything
//! downstream consumes that one shape. Historical days are never read from
//! these tables — the rollup already summarized them.

use chrono::{DateTime, Utc};
use promptwatch_core::EntityKey;
use sqlx::PgPool;

use crate::DbError;

/// One raw event with its dimensions resolved through the prompt join.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResolvedEventRow {
    pub entity_type: String,
    pub competitor_id: Option<i64>,
    pub platform: String,
    pub region_id: i64,
    pub topic_id: i64,
    pub occurred_at: DateTime<Utc>,
}

impl ResolvedEventRow {
    #[must_use]
    pub fn entity(&self) -> Option<EntityKey> {
        EntityKey::from_parts(&self.entity_type, self.competitor_id)
    }
}

/// Fetch mention events with `occurred_at` in `[lower, upper]`, dimensions
/// resolved, restricted to the platform whitelist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_resolved_mentions(
    pool: &PgPool,
    project_id: i64,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
    platform_whitelist: &[String],
) -> Result<Vec<ResolvedEventRow>, DbError> {
    let rows = sqlx::query_as::<_, ResolvedEventRow>(
        "SELECT me.entity_type, me.competitor_id, me.platform, \
                p.region_id, p.topic_id, me.occurred_at \
         FROM mention_events me \
         JOIN responses r ON r.id = me.response_id \
         JOIN prompts p ON p.id = r.prompt_id \
         WHERE me.project_id = $1 \
           AND me.occurred_at >= $2 \
           AND me.occurred_at <= $3 \
           AND me.platform = ANY($4::text[]) \
         ORDER BY me.occurred_at ASC, me.id ASC",
    )
    .bind(project_id)
    .bind(lower)
    .bind(upper)
    .bind(platform_whitelist)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch citation events with `occurred_at` in `[lower, upper]`, dimensions
/// resolved, restricted to the platform whitelist.
///
/// `citation_type = 'other'` rows (third-party domains supporting neither
/// entity) have no entity counterpart in the rollup table and are excluded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_resolved_citations(
    pool: &PgPool,
    project_id: i64,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
    platform_whitelist: &[String],
) -> Result<Vec<ResolvedEventRow>, DbError> {
    let rows = sqlx::query_as::<_, ResolvedEventRow>(
        "SELECT ce.citation_type AS entity_type, ce.competitor_id, ce.platform, \
                p.region_id, p.topic_id, ce.occurred_at \
         FROM citation_events ce \
         JOIN responses r ON r.id = ce.response_id \
         JOIN prompts p ON p.id = r.prompt_id \
         WHERE ce.project_id = $1 \
           AND ce.occurred_at >= $2 \
           AND ce.occurred_at <= $3 \
           AND ce.platform = ANY($4::text[]) \
           AND ce.citation_type IN ('brand', 'competitor') \
         ORDER BY ce.occurred_at ASC, ce.id ASC",
    )
    .bind(project_id)
    .bind(lower)
    .bind(upper)
    .bind(platform_whitelist)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

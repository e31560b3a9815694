//! Rollup store reader over the `daily_aggregates` table.
//!
//! A direct range-and-filter read; the nightly batch job owns the writes and
//! this service never mutates the table.

use chrono::NaiveDate;
use promptwatch_core::{AggRow, Counts, DimensionFilters, EntityKey};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `daily_aggregates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RollupRow {
    pub entity_type: String,
    pub competitor_id: Option<i64>,
    pub platform: String,
    pub region_id: i64,
    pub topic_id: i64,
    pub day: NaiveDate,
    pub mentions_count: i32,
    pub citations_count: i32,
}

impl RollupRow {
    /// Convert into the merger's row shape. Returns `None` for an
    /// inconsistent `(entity_type, competitor_id)` pair, which the table's
    /// CHECK constraint should make impossible.
    #[must_use]
    pub fn into_agg_row(self) -> Option<AggRow> {
        let entity = EntityKey::from_parts(&self.entity_type, self.competitor_id)?;
        Some(AggRow {
            entity,
            platform: self.platform,
            region_id: self.region_id,
            topic_id: self.topic_id,
            day: self.day,
            counts: Counts::new(
                i64::from(self.mentions_count),
                i64::from(self.citations_count),
            ),
        })
    }
}

/// Fetch every daily aggregate row for the inclusive `[start_day, end_day]`
/// range matching the optional dimension filters, restricted to the supported
/// platform whitelist. Returns an empty vec when nothing matches.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_daily_aggregates(
    pool: &PgPool,
    project_id: i64,
    start_day: NaiveDate,
    end_day: NaiveDate,
    filters: &DimensionFilters,
    platform_whitelist: &[String],
) -> Result<Vec<RollupRow>, DbError> {
    let rows = sqlx::query_as::<_, RollupRow>(
        "SELECT entity_type, competitor_id, platform, region_id, topic_id, \
                day, mentions_count, citations_count \
         FROM daily_aggregates \
         WHERE project_id = $1 \
           AND day >= $2 \
           AND day <= $3 \
           AND platform = ANY($4::text[]) \
           AND ($5::TEXT IS NULL OR platform = $5) \
           AND ($6::BIGINT IS NULL OR region_id = $6) \
           AND ($7::BIGINT IS NULL OR topic_id = $7) \
         ORDER BY day ASC, platform ASC, entity_type ASC, competitor_id ASC NULLS FIRST",
    )
    .bind(project_id)
    .bind(start_day)
    .bind(end_day)
    .bind(platform_whitelist)
    .bind(filters.platform.as_deref())
    .bind(filters.region_id)
    .bind(filters.topic_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entity_type: &str, competitor_id: Option<i64>) -> RollupRow {
        RollupRow {
            entity_type: entity_type.to_string(),
            competitor_id,
            platform: "chatgpt".to_string(),
            region_id: 1,
            topic_id: 1,
            day: NaiveDate::from_ymd_opt(2025, 6, 1).expect("date"),
            mentions_count: 3,
            citations_count: 1,
        }
    }

    #[test]
    fn into_agg_row_maps_brand_and_competitor() {
        let brand = row("brand", None).into_agg_row().expect("brand row");
        assert_eq!(brand.entity, EntityKey::Brand);
        assert_eq!(brand.counts, Counts::new(3, 1));

        let competitor = row("competitor", Some(4)).into_agg_row().expect("competitor row");
        assert_eq!(competitor.entity, EntityKey::Competitor(4));
    }

    #[test]
    fn into_agg_row_rejects_inconsistent_pairs() {
        assert!(row("brand", Some(4)).into_agg_row().is_none());
        assert!(row("competitor", None).into_agg_row().is_none());
    }

    mod integration {
        use super::*;
        use crate::test_support::{
            seed_aggregate, seed_competitor, seed_project, seed_region, seed_topic,
        };

        fn d(s: &str) -> NaiveDate {
            s.parse().expect("date literal")
        }

        fn whitelist() -> Vec<String> {
            vec!["chatgpt".to_string(), "perplexity".to_string()]
        }

        #[sqlx::test(migrations = "../../migrations")]
        async fn range_read_is_inclusive_on_both_ends(pool: PgPool) {
            let project_id = seed_project(&pool, "Acme").await;
            let region_id = seed_region(&pool, project_id, "US").await;
            let topic_id = seed_topic(&pool, project_id, "pricing").await;

            for day in ["2025-05-31", "2025-06-01", "2025-06-03", "2025-06-04"] {
                seed_aggregate(
                    &pool, project_id, "brand", None, "chatgpt", region_id, topic_id,
                    d(day), 2, 0,
                )
                .await;
            }

            let rows = fetch_daily_aggregates(
                &pool,
                project_id,
                d("2025-06-01"),
                d("2025-06-03"),
                &DimensionFilters::default(),
                &whitelist(),
            )
            .await
            .expect("query ok");

            let days: Vec<NaiveDate> = rows.iter().map(|r| r.day).collect();
            assert_eq!(days, vec![d("2025-06-01"), d("2025-06-03")]);
        }

        #[sqlx::test(migrations = "../../migrations")]
        async fn off_whitelist_platforms_are_excluded(pool: PgPool) {
            let project_id = seed_project(&pool, "Acme").await;
            let region_id = seed_region(&pool, project_id, "US").await;
            let topic_id = seed_topic(&pool, project_id, "pricing").await;

            seed_aggregate(
                &pool, project_id, "brand", None, "chatgpt", region_id, topic_id,
                d("2025-06-01"), 5, 0,
            )
            .await;
            seed_aggregate(
                &pool, project_id, "brand", None, "defunct-engine", region_id, topic_id,
                d("2025-06-01"), 9, 0,
            )
            .await;

            let rows = fetch_daily_aggregates(
                &pool,
                project_id,
                d("2025-06-01"),
                d("2025-06-01"),
                &DimensionFilters::default(),
                &whitelist(),
            )
            .await
            .expect("query ok");

            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].platform, "chatgpt");
        }

        #[sqlx::test(migrations = "../../migrations")]
        async fn dimension_filters_restrict_rows(pool: PgPool) {
            let project_id = seed_project(&pool, "Acme").await;
            let us = seed_region(&pool, project_id, "US").await;
            let de = seed_region(&pool, project_id, "DE").await;
            let topic_id = seed_topic(&pool, project_id, "pricing").await;
            let competitor_id = seed_competitor(&pool, project_id, "Rival", true).await;

            seed_aggregate(
                &pool, project_id, "brand", None, "chatgpt", us, topic_id,
                d("2025-06-01"), 4, 1,
            )
            .await;
            seed_aggregate(
                &pool, project_id, "brand", None, "chatgpt", de, topic_id,
                d("2025-06-01"), 7, 0,
            )
            .await;
            seed_aggregate(
                &pool, project_id, "competitor", Some(competitor_id), "perplexity", us,
                topic_id, d("2025-06-01"), 2, 0,
            )
            .await;

            let filters = DimensionFilters {
                platform: Some("chatgpt".to_string()),
                region_id: Some(us),
                topic_id: None,
            };
            let rows = fetch_daily_aggregates(
                &pool,
                project_id,
                d("2025-06-01"),
                d("2025-06-01"),
                &filters,
                &whitelist(),
            )
            .await
            .expect("query ok");

            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].mentions_count, 4);
            assert_eq!(rows[0].region_id, us);
        }

        #[sqlx::test(migrations = "../../migrations")]
        async fn empty_match_returns_empty_vec(pool: PgPool) {
            let project_id = seed_project(&pool, "Acme").await;

            let rows = fetch_daily_aggregates(
                &pool,
                project_id,
                d("2025-06-01"),
                d("2025-06-30"),
                &DimensionFilters::default(),
                &whitelist(),
            )
            .await
            .expect("query ok");

            assert!(rows.is_empty());
        }
    }
}

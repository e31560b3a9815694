//! Dimension resolution: human-facing region/topic codes to the canonical
//! ids used in filtering joins.
//!
//! Resolution fails open: a code that does not exist for the project means
//! "no filter", never an error, because filter UI options may lag behind the
//! data. Platform resolution lives in `promptwatch_core::platforms` — the
//! whitelist is configuration, not a table.

use sqlx::PgPool;

use crate::DbError;

/// A row from the `regions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegionRow {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// A row from the `topics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopicRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

/// The filter values that mean "no filtering on this dimension".
fn is_unfiltered_sentinel(code: &str) -> bool {
    code.is_empty() || code.eq_ignore_ascii_case("all") || code.eq_ignore_ascii_case("global")
}

/// Resolve a region code to its id for filtering, or `None` when no filter
/// should be applied (`GLOBAL`/`all`/empty/absent sentinel, or unknown code).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the lookup query fails.
pub async fn resolve_region(
    pool: &PgPool,
    project_id: i64,
    code: Option<&str>,
) -> Result<Option<i64>, DbError> {
    let Some(code) = code.map(str::trim).filter(|c| !is_unfiltered_sentinel(c)) else {
        return Ok(None);
    };

    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM regions WHERE project_id = $1 AND code = $2",
    )
    .bind(project_id)
    .bind(code)
    .fetch_optional(pool)
    .await?;

    if id.is_none() {
        tracing::debug!(project_id, code, "unknown region code, leaving unfiltered");
    }
    Ok(id)
}

/// Resolve a topic slug to its id for filtering; same fail-open policy as
/// [`resolve_region`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the lookup query fails.
pub async fn resolve_topic(
    pool: &PgPool,
    project_id: i64,
    slug: Option<&str>,
) -> Result<Option<i64>, DbError> {
    let Some(slug) = slug.map(str::trim).filter(|s| !is_unfiltered_sentinel(s)) else {
        return Ok(None);
    };

    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM topics WHERE project_id = $1 AND slug = $2",
    )
    .bind(project_id)
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    if id.is_none() {
        tracing::debug!(project_id, slug, "unknown topic slug, leaving unfiltered");
    }
    Ok(id)
}

/// List a project's regions, ordered by code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_regions(pool: &PgPool, project_id: i64) -> Result<Vec<RegionRow>, DbError> {
    let rows = sqlx::query_as::<_, RegionRow>(
        "SELECT id, code, name FROM regions WHERE project_id = $1 ORDER BY code",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List a project's topics, ordered by slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_topics(pool: &PgPool, project_id: i64) -> Result<Vec<TopicRow>, DbError> {
    let rows = sqlx::query_as::<_, TopicRow>(
        "SELECT id, slug, name FROM topics WHERE project_id = $1 ORDER BY slug",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_project, seed_region, seed_topic};

    #[test]
    fn sentinels_cover_global_all_and_empty() {
        for code in ["", "all", "ALL", "global", "GLOBAL"] {
            assert!(is_unfiltered_sentinel(code), "'{code}' should be a sentinel");
        }
        assert!(!is_unfiltered_sentinel("US"));
        assert!(!is_unfiltered_sentinel("pricing"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn resolve_region_returns_id_for_known_code(pool: PgPool) {
        let project_id = seed_project(&pool, "Acme").await;
        let region_id = seed_region(&pool, project_id, "US").await;

        let resolved = resolve_region(&pool, project_id, Some("US"))
            .await
            .expect("query ok");
        assert_eq!(resolved, Some(region_id));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn resolve_region_fails_open_for_unknown_code(pool: PgPool) {
        let project_id = seed_project(&pool, "Acme").await;
        seed_region(&pool, project_id, "US").await;

        let resolved = resolve_region(&pool, project_id, Some("ZZ"))
            .await
            .expect("query ok");
        assert_eq!(resolved, None);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn resolve_region_sentinels_mean_no_filter(pool: PgPool) {
        let project_id = seed_project(&pool, "Acme").await;
        seed_region(&pool, project_id, "GLOBAL").await;

        // Even though a literal "GLOBAL" row exists, the sentinel wins.
        for code in [None, Some(""), Some("all"), Some("GLOBAL")] {
            let resolved = resolve_region(&pool, project_id, code)
                .await
                .expect("query ok");
            assert_eq!(resolved, None, "code {code:?} should not filter");
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn resolve_region_is_project_scoped(pool: PgPool) {
        let project_a = seed_project(&pool, "Acme").await;
        let project_b = seed_project(&pool, "Other").await;
        seed_region(&pool, project_a, "US").await;

        let resolved = resolve_region(&pool, project_b, Some("US"))
            .await
            .expect("query ok");
        assert_eq!(resolved, None);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn resolve_topic_by_slug(pool: PgPool) {
        let project_id = seed_project(&pool, "Acme").await;
        let topic_id = seed_topic(&pool, project_id, "pricing").await;

        let resolved = resolve_topic(&pool, project_id, Some("pricing"))
            .await
            .expect("query ok");
        assert_eq!(resolved, Some(topic_id));

        let missing = resolve_topic(&pool, project_id, Some("nonexistent"))
            .await
            .expect("query ok");
        assert_eq!(missing, None);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_topics_is_ordered_by_slug(pool: PgPool) {
        let project_id = seed_project(&pool, "Acme").await;
        seed_topic(&pool, project_id, "shipping").await;
        seed_topic(&pool, project_id, "pricing").await;

        let topics = list_topics(&pool, project_id).await.expect("query ok");
        let slugs: Vec<&str> = topics.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["pricing", "shipping"]);
    }
}

//! Seed helpers for this crate's database-backed tests.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

pub async fn seed_project(pool: &PgPool, brand_name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO projects (name, brand_name, brand_domain) \
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("{brand_name} tracking"))
    .bind(brand_name)
    .bind(format!("{}.example.com", brand_name.to_lowercase()))
    .fetch_one(pool)
    .await
    .expect("seed project")
}

pub async fn seed_competitor(pool: &PgPool, project_id: i64, name: &str, active: bool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO competitors (project_id, name, is_active, deactivated_at) \
         VALUES ($1, $2, $3, CASE WHEN $3 THEN NULL ELSE NOW() END) RETURNING id",
    )
    .bind(project_id)
    .bind(name)
    .bind(active)
    .fetch_one(pool)
    .await
    .expect("seed competitor")
}

pub async fn seed_region(pool: &PgPool, project_id: i64, code: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO regions (project_id, code, name) VALUES ($1, $2, $2) RETURNING id",
    )
    .bind(project_id)
    .bind(code)
    .fetch_one(pool)
    .await
    .expect("seed region")
}

pub async fn seed_topic(pool: &PgPool, project_id: i64, slug: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO topics (project_id, slug, name) VALUES ($1, $2, $2) RETURNING id",
    )
    .bind(project_id)
    .bind(slug)
    .fetch_one(pool)
    .await
    .expect("seed topic")
}

pub async fn seed_prompt(pool: &PgPool, project_id: i64, region_id: i64, topic_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO prompts (project_id, region_id, topic_id, text) \
         VALUES ($1, $2, $3, 'best product for ...') RETURNING id",
    )
    .bind(project_id)
    .bind(region_id)
    .bind(topic_id)
    .fetch_one(pool)
    .await
    .expect("seed prompt")
}

pub async fn seed_response(pool: &PgPool, project_id: i64, prompt_id: i64, platform: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO responses (project_id, prompt_id, platform) \
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(project_id)
    .bind(prompt_id)
    .bind(platform)
    .fetch_one(pool)
    .await
    .expect("seed response")
}

#[allow(clippy::too_many_arguments)]
pub async fn seed_mention(
    pool: &PgPool,
    project_id: i64,
    response_id: i64,
    entity_type: &str,
    competitor_id: Option<i64>,
    platform: &str,
    occurred_at: DateTime<Utc>,
) {
    sqlx::query(
        "INSERT INTO mention_events \
             (project_id, response_id, entity_type, competitor_id, platform, occurred_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(project_id)
    .bind(response_id)
    .bind(entity_type)
    .bind(competitor_id)
    .bind(platform)
    .bind(occurred_at)
    .execute(pool)
    .await
    .expect("seed mention event");
}

#[allow(clippy::too_many_arguments)]
pub async fn seed_citation(
    pool: &PgPool,
    project_id: i64,
    response_id: i64,
    citation_type: &str,
    competitor_id: Option<i64>,
    platform: &str,
    occurred_at: DateTime<Utc>,
) {
    sqlx::query(
        "INSERT INTO citation_events \
             (project_id, response_id, citation_type, competitor_id, domain, platform, occurred_at) \
         VALUES ($1, $2, $3, $4, 'cited.example.com', $5, $6)",
    )
    .bind(project_id)
    .bind(response_id)
    .bind(citation_type)
    .bind(competitor_id)
    .bind(platform)
    .bind(occurred_at)
    .execute(pool)
    .await
    .expect("seed citation event");
}

#[allow(clippy::too_many_arguments)]
pub async fn seed_aggregate(
    pool: &PgPool,
    project_id: i64,
    entity_type: &str,
    competitor_id: Option<i64>,
    platform: &str,
    region_id: i64,
    topic_id: i64,
    day: NaiveDate,
    mentions: i32,
    citations: i32,
) {
    sqlx::query(
        "INSERT INTO daily_aggregates \
             (project_id, entity_type, competitor_id, platform, region_id, topic_id, \
              day, mentions_count, citations_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(project_id)
    .bind(entity_type)
    .bind(competitor_id)
    .bind(platform)
    .bind(region_id)
    .bind(topic_id)
    .bind(day)
    .bind(mentions)
    .bind(citations)
    .execute(pool)
    .await
    .expect("seed daily aggregate");
}

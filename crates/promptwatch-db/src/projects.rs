//! Project and competitor roster queries.

use chrono::{DateTime, Utc};
use promptwatch_core::{CompetitorRef, EntityRoster};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `projects` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub brand_name: String,
    pub brand_domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `competitors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub domain: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

/// Fetch a project by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_project(pool: &PgPool, project_id: i64) -> Result<Option<ProjectRow>, DbError> {
    let row = sqlx::query_as::<_, ProjectRow>(
        "SELECT id, public_id, name, brand_name, brand_domain, created_at \
         FROM projects \
         WHERE id = $1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List active competitors for a project, ordered by name.
///
/// Deactivated competitors keep their historical event and rollup rows but
/// never appear here, which is what excludes them from breakdowns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_competitors(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<CompetitorRow>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, project_id, name, domain, is_active, created_at, deactivated_at \
         FROM competitors \
         WHERE project_id = $1 AND is_active = TRUE \
         ORDER BY name ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Build the entity roster (brand + active competitors) for a project.
///
/// Returns `None` when the project does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn entity_roster(pool: &PgPool, project_id: i64) -> Result<Option<EntityRoster>, DbError> {
    let Some(project) = get_project(pool, project_id).await? else {
        return Ok(None);
    };

    let competitors = list_active_competitors(pool, project_id)
        .await?
        .into_iter()
        .map(|c| CompetitorRef {
            id: c.id,
            name: c.name,
        })
        .collect();

    Ok(Some(EntityRoster {
        brand_name: project.brand_name,
        competitors,
    }))
}

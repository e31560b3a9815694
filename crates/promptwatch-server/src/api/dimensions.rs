//! Filter-dimension listings backing the dashboard's region and topic
//! dropdowns.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct RegionItem {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct TopicItem {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

async fn require_project(
    state: &AppState,
    project_id: i64,
    request_id: &str,
) -> Result<(), ApiError> {
    let project = promptwatch_db::get_project(state.engine.pool(), project_id)
        .await
        .map_err(|e| map_db_error(request_id.to_string(), &e))?;
    if project.is_none() {
        return Err(ApiError::new(
            request_id,
            "not_found",
            format!("project {project_id} not found"),
        ));
    }
    Ok(())
}

pub(super) async fn list_regions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<RegionItem>>>, ApiError> {
    require_project(&state, project_id, &req_id.0).await?;

    let rows = promptwatch_db::list_regions(state.engine.pool(), project_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| RegionItem {
            id: row.id,
            code: row.code,
            name: row.name,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_topics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TopicItem>>>, ApiError> {
    require_project(&state, project_id, &req_id.0).await?;

    let rows = promptwatch_db::list_topics(state.engine.pool(), project_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| TopicItem {
            id: row.id,
            slug: row.slug,
            name: row.name,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_item_is_serializable() {
        let item = RegionItem {
            id: 3,
            code: "US".to_string(),
            name: "United States".to_string(),
        };
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(json.contains("\"code\":\"US\""));
    }
}

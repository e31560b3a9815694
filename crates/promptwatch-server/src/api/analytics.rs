//! Analytics route handlers: thin adapters from query strings to
//! [`AnalyticsRequest`] and from engine results to the response envelope.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use promptwatch_core::DateRange;
use promptwatch_engine::{
    AnalyticsRequest, EntityBreakdown, Evolution, Momentum, Overview, TopicPerformance,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyticsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub platform: Option<String>,
    pub region: Option<String>,
    pub topic: Option<String>,
    /// Override for "now", mainly for reproducible queries and tests.
    pub as_of: Option<DateTime<Utc>>,
}

fn build_request(
    project_id: i64,
    query: AnalyticsQuery,
    request_id: &str,
) -> Result<AnalyticsRequest, ApiError> {
    let range = match (query.from, query.to) {
        (Some(from), Some(to)) => Some(
            DateRange::new(from, to)
                .map_err(|e| ApiError::new(request_id, "bad_request", e.to_string()))?,
        ),
        (None, None) => None,
        _ => {
            return Err(ApiError::new(
                request_id,
                "bad_request",
                "from and to must be provided together",
            ))
        }
    };

    Ok(AnalyticsRequest {
        project_id,
        range,
        platform: query.platform,
        region: query.region,
        topic: query.topic,
        as_of: query.as_of.unwrap_or_else(Utc::now),
    })
}

pub(super) async fn overview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Overview>>, ApiError> {
    let request = build_request(project_id, query, &req_id.0)?;
    let data = state
        .engine
        .overview(&request)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn evolution(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Evolution>>, ApiError> {
    let request = build_request(project_id, query, &req_id.0)?;
    let data = state
        .engine
        .evolution(&request)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn breakdown(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<EntityBreakdown>>, ApiError> {
    let request = build_request(project_id, query, &req_id.0)?;
    let data = state
        .engine
        .breakdown(&request)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn topic_performance(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<TopicPerformance>>, ApiError> {
    let request = build_request(project_id, query, &req_id.0)?;
    let data = state
        .engine
        .topic_performance(&request)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn momentum(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Momentum>>, ApiError> {
    let request = build_request(project_id, query, &req_id.0)?;
    let data = state
        .engine
        .momentum(&request)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_per_page, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ScrapePassItem {
    public_id: Uuid,
    trigger_source: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    pages_fetched: i32,
    records_processed: i32,
    records_failed: i32,
    records_archived: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PassQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_passes(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PassQuery>,
) -> Result<Json<ApiResponse<Vec<ScrapePassItem>>>, ApiError> {
    let rows = vinpris_db::list_scrape_passes(&state.pool, normalize_per_page(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ScrapePassItem {
            public_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            pages_fetched: row.pages_fetched,
            records_processed: row.records_processed,
            records_failed: row.records_failed,
            records_archived: row.records_archived,
            error_message: row.error_message,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

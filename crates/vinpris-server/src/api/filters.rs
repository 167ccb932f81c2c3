use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Distinct attribute values for populating the listing filter dropdowns.
#[derive(Debug, Serialize)]
pub(super) struct FilterValues {
    categories: Vec<String>,
    countries: Vec<String>,
}

pub(super) async fn list_filters(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<FilterValues>>, ApiError> {
    let categories = vinpris_db::distinct_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let countries = vinpris_db::distinct_countries(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: FilterValues {
            categories,
            countries,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

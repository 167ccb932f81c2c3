use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vinpris_core::{SortKey, SortOrder};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_per_page, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    index: i64,
    name: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    country: Option<String>,
    district: Option<String>,
    subdistrict: Option<String>,
    url: Option<String>,
    price: f64,
    old_price: Option<f64>,
    volume: f64,
    alcohol: Option<f64>,
    discount_percent: f64,
    liter_price: Option<f64>,
    alcohol_price: Option<f64>,
    year: Option<i32>,
    buyable: bool,
    orderable: bool,
    in_stores: bool,
    status: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    #[serde(flatten)]
    item: ProductItem,
    price_history: Vec<f64>,
    first_seen_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct PaginatedProducts {
    items: Vec<ProductItem>,
    total: i64,
    page: i64,
    per_page: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub category: Option<String>,
    pub country: Option<String>,
    pub year: Option<i32>,
    pub volume_min: Option<f64>,
    pub alcohol_min: Option<f64>,
    pub search: Option<String>,
    pub buyable: Option<bool>,
    pub orderable: Option<bool>,
    pub in_stores: Option<bool>,
    /// One of the fixed sort keys; rejected with 400 when unknown.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl From<vinpris_db::ProductRow> for ProductDetail {
    fn from(row: vinpris_db::ProductRow) -> Self {
        Self {
            item: ProductItem {
                index: row.index,
                name: row.name,
                category: row.category,
                subcategory: row.subcategory,
                country: row.country,
                district: row.district,
                subdistrict: row.subdistrict,
                url: row.url,
                price: row.price,
                old_price: row.old_price,
                volume: row.volume,
                alcohol: row.alcohol,
                discount_percent: row.discount_percent,
                liter_price: row.liter_price,
                alcohol_price: row.alcohol_price,
                year: row.year,
                buyable: row.buyable,
                orderable: row.orderable,
                in_stores: row.in_stores,
                status: row.status,
                updated_at: row.updated_at,
            },
            price_history: row.price_history,
            first_seen_at: row.first_seen_at,
        }
    }
}

impl From<vinpris_db::ProductListRow> for ProductItem {
    fn from(row: vinpris_db::ProductListRow) -> Self {
        Self {
            index: row.index,
            name: row.name,
            category: row.category,
            subcategory: row.subcategory,
            country: row.country,
            district: row.district,
            subdistrict: row.subdistrict,
            url: row.url,
            price: row.price,
            old_price: row.old_price,
            volume: row.volume,
            alcohol: row.alcohol,
            discount_percent: row.discount_percent,
            liter_price: row.liter_price,
            alcohol_price: row.alcohol_price,
            year: row.year,
            buyable: row.buyable,
            orderable: row.orderable,
            in_stores: row.in_stores,
            status: row.status,
            updated_at: row.updated_at,
        }
    }
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<PaginatedProducts>>, ApiError> {
    let sort = parse_sort_key(&req_id.0, query.sort.as_deref())?;
    let order = parse_sort_order(&req_id.0, query.order.as_deref())?;

    let per_page = normalize_per_page(query.per_page);
    let page = query.page.unwrap_or(0).max(0);

    let filters = vinpris_db::ProductFilters {
        category: query.category.as_deref(),
        country: query.country.as_deref(),
        year: query.year,
        volume_min: query.volume_min,
        alcohol_min: query.alcohol_min,
        search: query.search.as_deref(),
        buyable: query.buyable,
        orderable: query.orderable,
        in_stores: query.in_stores,
        sort,
        order,
        limit: per_page,
        offset: page * per_page,
    };

    let rows = vinpris_db::list_products(&state.pool, &filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let total = vinpris_db::count_products(&state.pool, &filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items = rows.into_iter().map(ProductItem::from).collect();

    Ok(Json(ApiResponse {
        data: PaginatedProducts {
            items,
            total,
            page,
            per_page,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(index): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let row = vinpris_db::get_product(&state.pool, index)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("no product with index {index}"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: ProductDetail::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn parse_sort_key(request_id: &str, raw: Option<&str>) -> Result<SortKey, ApiError> {
    raw.map_or(Ok(SortKey::default()), |s| {
        s.parse().map_err(|e: vinpris_core::SortKeyParseError| {
            ApiError::new(request_id.to_owned(), "bad_request", e.to_string())
        })
    })
}

fn parse_sort_order(request_id: &str, raw: Option<&str>) -> Result<SortOrder, ApiError> {
    raw.map_or(Ok(SortOrder::default()), |s| {
        s.parse().map_err(|_| {
            ApiError::new(
                request_id.to_owned(),
                "bad_request",
                format!("order must be \"asc\" or \"desc\", got {s:?}"),
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_defaults_to_discount_ascending() {
        assert_eq!(parse_sort_key("r", None).unwrap(), SortKey::Discount);
        assert_eq!(parse_sort_order("r", None).unwrap(), SortOrder::Ascending);
    }

    #[test]
    fn known_sort_key_is_accepted() {
        assert_eq!(
            parse_sort_key("r", Some("alcohol-price")).unwrap(),
            SortKey::AlcoholPrice
        );
    }

    #[test]
    fn unknown_sort_key_is_a_bad_request() {
        let err = parse_sort_key("r", Some("cunning; DROP TABLE")).unwrap_err();
        assert_eq!(err.error.code, "bad_request");
    }

    #[test]
    fn unknown_sort_order_is_a_bad_request() {
        let err = parse_sort_order("r", Some("sideways")).unwrap_err();
        assert_eq!(err.error.code, "bad_request");
    }
}

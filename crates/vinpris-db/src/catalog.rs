//! Read-model queries for the listing server.
//!
//! Everything here is read-only over the canonical product shape. Filters
//! are a conjunction of optional constraints bound as nullable parameters;
//! the sort column comes from the fixed [`SortKey`] table, never from a
//! caller-supplied string.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vinpris_core::{SortKey, SortOrder};

use crate::DbError;

/// A full row from the `products` table, including the price history.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub index: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub country: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub url: Option<String>,
    pub price: f64,
    pub old_price: Option<f64>,
    pub price_history: Vec<f64>,
    pub volume: f64,
    pub alcohol: Option<f64>,
    pub discount_percent: f64,
    pub liter_price: Option<f64>,
    pub alcohol_price: Option<f64>,
    pub year: Option<i32>,
    pub updated: bool,
    pub buyable: bool,
    pub orderable: bool,
    pub in_stores: bool,
    pub status: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listing row: the canonical fields minus the price history, which is
/// only served on the detail endpoint.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductListRow {
    pub index: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub country: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub url: Option<String>,
    pub price: f64,
    pub old_price: Option<f64>,
    pub volume: f64,
    pub alcohol: Option<f64>,
    pub discount_percent: f64,
    pub liter_price: Option<f64>,
    pub alcohol_price: Option<f64>,
    pub year: Option<i32>,
    pub buyable: bool,
    pub orderable: bool,
    pub in_stores: bool,
    pub status: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Input filters for the product listing. Every constraint is optional;
/// the set is applied as a conjunction.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters<'a> {
    pub category: Option<&'a str>,
    pub country: Option<&'a str>,
    pub year: Option<i32>,
    pub volume_min: Option<f64>,
    pub alcohol_min: Option<f64>,
    /// Case-insensitive substring match on `name`.
    pub search: Option<&'a str>,
    pub buyable: Option<bool>,
    pub orderable: Option<bool>,
    pub in_stores: Option<bool>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

const LIST_COLUMNS: &str = "index, name, category, subcategory, country, district, subdistrict, \
                            url, price, old_price, volume, alcohol, discount_percent, \
                            liter_price, alcohol_price, year, buyable, orderable, in_stores, \
                            status, updated_at";

const FILTER_CLAUSE: &str = "($1::TEXT IS NULL OR category = $1) \
                         AND ($2::TEXT IS NULL OR country = $2) \
                         AND ($3::INTEGER IS NULL OR year = $3) \
                         AND ($4::DOUBLE PRECISION IS NULL OR volume >= $4) \
                         AND ($5::DOUBLE PRECISION IS NULL OR alcohol >= $5) \
                         AND ($6::TEXT IS NULL OR name ILIKE '%' || $6 || '%') \
                         AND ($7::BOOLEAN IS NULL OR buyable = $7) \
                         AND ($8::BOOLEAN IS NULL OR orderable = $8) \
                         AND ($9::BOOLEAN IS NULL OR in_stores = $9)";

/// Returns one page of products matching the filters.
///
/// Nullable sort columns (`liter_price`, `alcohol_price`, ...) sort with
/// unknown values last in either direction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: &ProductFilters<'_>,
) -> Result<Vec<ProductListRow>, DbError> {
    // Sort column and direction both come from fixed enum tables, so the
    // formatted string contains no caller-controlled text.
    let sql = format!(
        "SELECT {LIST_COLUMNS} FROM products \
         WHERE {FILTER_CLAUSE} \
         ORDER BY {column} {direction} NULLS LAST, index ASC \
         LIMIT $10 OFFSET $11",
        column = filters.sort.column(),
        direction = filters.order.sql(),
    );

    let rows = sqlx::query_as::<_, ProductListRow>(&sql)
        .bind(filters.category)
        .bind(filters.country)
        .bind(filters.year)
        .bind(filters.volume_min)
        .bind(filters.alcohol_min)
        .bind(filters.search)
        .bind(filters.buyable)
        .bind(filters.orderable)
        .bind(filters.in_stores)
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Total number of products matching the filters, for pagination metadata.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(pool: &PgPool, filters: &ProductFilters<'_>) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM products WHERE {FILTER_CLAUSE}");

    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(filters.category)
        .bind(filters.country)
        .bind(filters.year)
        .bind(filters.volume_min)
        .bind(filters.alcohol_min)
        .bind(filters.search)
        .bind(filters.buyable)
        .bind(filters.orderable)
        .bind(filters.in_stores)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Fetches a single product by its feed index, with full price history.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, index: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT index, name, category, subcategory, country, district, subdistrict, url, \
                price, old_price, price_history, volume, alcohol, discount_percent, \
                liter_price, alcohol_price, year, updated, buyable, orderable, in_stores, \
                status, first_seen_at, updated_at \
         FROM products WHERE index = $1",
    )
    .bind(index)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Distinct non-null categories, for dropdown population.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn distinct_categories(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM products WHERE category IS NOT NULL ORDER BY category",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Distinct non-null countries, for dropdown population.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn distinct_countries(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT country FROM products WHERE country IS NOT NULL ORDER BY country",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

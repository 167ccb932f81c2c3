//! Database operations for `scrape_passes` and stale-record reconciliation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scrape_passes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapePassRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub pages_fetched: i32,
    pub records_processed: i32,
    pub records_failed: i32,
    pub records_archived: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

const PASS_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
                            pages_fetched, records_processed, records_failed, records_archived, \
                            error_message, created_at";

// ---------------------------------------------------------------------------
// scrape_passes operations
// ---------------------------------------------------------------------------

/// Creates a new scrape pass in `queued` status.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scrape_pass(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<ScrapePassRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ScrapePassRow>(&format!(
        "INSERT INTO scrape_passes (public_id, trigger_source, status) \
         VALUES ($1, $2, 'queued') \
         RETURNING {PASS_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a pass as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that id, or [`DbError::Sqlx`]
/// on query failure.
pub async fn start_scrape_pass(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_passes SET status = 'running', started_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Marks a pass as `completed` and records its totals.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that id, or [`DbError::Sqlx`]
/// on query failure.
pub async fn complete_scrape_pass(
    pool: &PgPool,
    id: i64,
    pages_fetched: i32,
    records_processed: i32,
    records_failed: i32,
    records_archived: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_passes SET \
             status = 'completed', \
             completed_at = NOW(), \
             pages_fetched = $2, \
             records_processed = $3, \
             records_failed = $4, \
             records_archived = $5 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(pages_fetched)
    .bind(records_processed)
    .bind(records_failed)
    .bind(records_archived)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Marks a pass as `failed` with an error message, preserving whatever
/// totals were reached before the failure.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that id, or [`DbError::Sqlx`]
/// on query failure.
pub async fn fail_scrape_pass(
    pool: &PgPool,
    id: i64,
    pages_fetched: i32,
    records_processed: i32,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_passes SET \
             status = 'failed', \
             completed_at = NOW(), \
             pages_fetched = $2, \
             records_processed = $3, \
             error_message = $4 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(pages_fetched)
    .bind(records_processed)
    .bind(error_message)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Lists the most recent scrape passes, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_passes(pool: &PgPool, limit: i64) -> Result<Vec<ScrapePassRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapePassRow>(&format!(
        "SELECT {PASS_COLUMNS} FROM scrape_passes ORDER BY created_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// stale-record reconciliation
// ---------------------------------------------------------------------------

/// Clears the refreshed flag on every live record. Run once at the start of
/// a full pass; each successful upsert sets the flag back.
///
/// Returns the number of records marked.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_all_stale(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("UPDATE products SET updated = FALSE")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Indexes already refreshed in the current pass.
///
/// Used by `--resume` to skip records committed before a crash, instead of
/// re-appending their prices to the history.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_updated_indexes(pool: &PgPool) -> Result<Vec<i64>, DbError> {
    let rows = sqlx::query_scalar::<_, i64>("SELECT index FROM products WHERE updated = TRUE")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Number of live records not refreshed by the current pass.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_stale(pool: &PgPool) -> Result<i64, DbError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE updated = FALSE")
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Moves every stale record into `expired_products` and removes it from the
/// live table, in one transaction. A record that expires, relists, and
/// expires again overwrites its previous archive snapshot.
///
/// Returns the number of records archived.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails; the transaction is
/// rolled back and the live table is untouched.
pub async fn archive_stale(pool: &PgPool) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO expired_products \
             (index, name, category, subcategory, country, district, subdistrict, url, \
              price, old_price, price_history, volume, alcohol, \
              discount_percent, liter_price, alcohol_price, year, \
              buyable, orderable, in_stores, status, first_seen_at, archived_at) \
         SELECT index, name, category, subcategory, country, district, subdistrict, url, \
                price, old_price, price_history, volume, alcohol, \
                discount_percent, liter_price, alcohol_price, year, \
                buyable, orderable, in_stores, status, first_seen_at, NOW() \
         FROM products WHERE updated = FALSE \
         ON CONFLICT (index) DO UPDATE SET \
             name             = EXCLUDED.name, \
             category         = EXCLUDED.category, \
             subcategory      = EXCLUDED.subcategory, \
             country          = EXCLUDED.country, \
             district         = EXCLUDED.district, \
             subdistrict      = EXCLUDED.subdistrict, \
             url              = EXCLUDED.url, \
             price            = EXCLUDED.price, \
             old_price        = EXCLUDED.old_price, \
             price_history    = EXCLUDED.price_history, \
             volume           = EXCLUDED.volume, \
             alcohol          = EXCLUDED.alcohol, \
             discount_percent = EXCLUDED.discount_percent, \
             liter_price      = EXCLUDED.liter_price, \
             alcohol_price    = EXCLUDED.alcohol_price, \
             year             = EXCLUDED.year, \
             buyable          = EXCLUDED.buyable, \
             orderable        = EXCLUDED.orderable, \
             in_stores        = EXCLUDED.in_stores, \
             status           = EXCLUDED.status, \
             first_seen_at    = EXCLUDED.first_seen_at, \
             archived_at      = NOW()",
    )
    .execute(&mut *tx)
    .await?;

    let deleted = sqlx::query("DELETE FROM products WHERE updated = FALSE")
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    Ok(deleted)
}

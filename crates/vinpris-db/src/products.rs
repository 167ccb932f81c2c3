//! The price-derivation upsert for the `products` table.
//!
//! Each candidate is merged by `index` in a single `INSERT ... ON CONFLICT`
//! statement. The conflict arm is expression-based: `old_price` is read from
//! the pre-update row and the new price is appended to `price_history` inside
//! the same statement, so there is no fetch-then-write window against other
//! writers. The derived columns are recomputed in full on every upsert —
//! the conflict arm carries the same formulas as
//! [`vinpris_core::pricing`], which also feeds the insert arm, so creation
//! and refresh share one policy.

use sqlx::PgPool;

use vinpris_core::{pricing, ProductCandidate};

use crate::DbError;

/// One record that failed to upsert within a batch.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub index: i64,
    pub error: String,
}

/// Result of a batch upsert. Failures never abort the rest of the batch;
/// they are collected here for the caller to log and count.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub upserted: u32,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Returns `true` if every record in the batch was applied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Upserts one candidate by `index`, recomputing all derived price fields.
///
/// On conflict the statement, in one atomic step against the stored row:
/// moves the stored `price` into `old_price`, overwrites every
/// normalizer-supplied column, appends the new price to `price_history`,
/// recomputes `discount_percent` / `liter_price` / `alcohol_price`, and
/// flags the record as refreshed. A fresh insert starts the history at
/// `[price]` with no `old_price` and a zero discount — the same formulas
/// applied to an absent prior row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(pool: &PgPool, candidate: &ProductCandidate) -> Result<(), DbError> {
    let derived = pricing::derive_prices(None, candidate.price, candidate.volume, candidate.alcohol);

    sqlx::query(
        "INSERT INTO products \
             (index, name, category, subcategory, country, district, subdistrict, url, \
              price, volume, alcohol, year, buyable, orderable, in_stores, status, \
              old_price, price_history, discount_percent, liter_price, alcohol_price, updated) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, \
                 $9, $10, $11, $12, $13, $14, $15, $16, \
                 NULL, ARRAY[$9], 0, $17, $18, TRUE) \
         ON CONFLICT (index) DO UPDATE SET \
             name             = EXCLUDED.name, \
             category         = EXCLUDED.category, \
             subcategory      = EXCLUDED.subcategory, \
             country          = EXCLUDED.country, \
             district         = EXCLUDED.district, \
             subdistrict      = EXCLUDED.subdistrict, \
             url              = EXCLUDED.url, \
             volume           = EXCLUDED.volume, \
             alcohol          = EXCLUDED.alcohol, \
             year             = EXCLUDED.year, \
             buyable          = EXCLUDED.buyable, \
             orderable        = EXCLUDED.orderable, \
             in_stores        = EXCLUDED.in_stores, \
             status           = EXCLUDED.status, \
             old_price        = products.price, \
             price            = EXCLUDED.price, \
             price_history    = products.price_history || EXCLUDED.price, \
             discount_percent = CASE \
                 WHEN products.price > 0 AND EXCLUDED.price > 0 \
                 THEN (EXCLUDED.price - products.price) / products.price * 100 \
                 ELSE 0 END, \
             liter_price      = CASE \
                 WHEN EXCLUDED.price > 0 AND EXCLUDED.volume > 0 \
                 THEN EXCLUDED.price / EXCLUDED.volume * 100 END, \
             alcohol_price    = CASE \
                 WHEN EXCLUDED.price > 0 AND EXCLUDED.volume > 0 AND EXCLUDED.alcohol > 0 \
                 THEN (EXCLUDED.price / EXCLUDED.volume * 100) / EXCLUDED.alcohol END, \
             updated          = TRUE, \
             updated_at       = NOW()",
    )
    .bind(candidate.index)
    .bind(&candidate.name)
    .bind(&candidate.category)
    .bind(&candidate.subcategory)
    .bind(&candidate.country)
    .bind(&candidate.district)
    .bind(&candidate.subdistrict)
    .bind(&candidate.url)
    .bind(candidate.price)
    .bind(candidate.volume)
    .bind(candidate.alcohol)
    .bind(candidate.year)
    .bind(candidate.buyable)
    .bind(candidate.orderable)
    .bind(candidate.in_stores)
    .bind(&candidate.status)
    .bind(derived.liter_price)
    .bind(derived.alcohol_price)
    .execute(pool)
    .await?;

    Ok(())
}

/// Upserts a batch of candidates, isolating per-record failures.
///
/// Records are applied sequentially in input order, so repeated sightings of
/// one `index` within a batch land in feed order. The engine does not order
/// concurrent upserts of the same `index` across overlapping batches; a
/// caller that runs batches concurrently must serialize per index itself.
pub async fn upsert_batch(pool: &PgPool, candidates: &[ProductCandidate]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for candidate in candidates {
        match upsert_product(pool, candidate).await {
            Ok(()) => outcome.upserted += 1,
            Err(e) => {
                tracing::warn!(
                    index = candidate.index,
                    error = %e,
                    "record upsert failed; continuing batch"
                );
                outcome.failures.push(BatchFailure {
                    index: candidate.index,
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_outcome_is_clean_without_failures() {
        let outcome = BatchOutcome {
            upserted: 10,
            failures: vec![],
        };
        assert!(outcome.is_clean());
    }

    #[test]
    fn batch_outcome_is_dirty_with_failures() {
        let outcome = BatchOutcome {
            upserted: 9,
            failures: vec![BatchFailure {
                index: 42,
                error: "connection reset".to_string(),
            }],
        };
        assert!(!outcome.is_clean());
    }
}

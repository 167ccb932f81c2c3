//! Core pass pipeline: sequential pagination, batched upserts, and
//! stale-record reconciliation.

use std::collections::HashSet;
use std::time::Duration;

use vinpris_core::{AppConfig, ProductCandidate};
use vinpris_scraper::FeedClient;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScrapeOptions {
    pub start_page: u32,
    pub resume: bool,
}

/// Running totals for one pass. Kept outside `drive_pass` so the caller can
/// record partial progress when the pass aborts midway.
#[derive(Debug, Default)]
pub(crate) struct PassProgress {
    pub pages_fetched: i32,
    pub processed: i32,
    pub failed: i32,
    pub archived: i32,
}

/// Drives one full pass over the feed.
///
/// Pages are fetched sequentially in ascending order with the configured
/// inter-request delay; candidates accumulate and flush as a batch upsert
/// every `scrape_batch_pages` pages. The first empty page ends pagination;
/// reconciliation then archives whatever the pass did not refresh, unless
/// the stale count trips the threshold guard.
///
/// # Errors
///
/// Returns an error when a page fetch exhausts its retries (aborting the
/// remaining pagination without discarding committed batches), when a flush
/// window produced no records at all (a broken feed), or when
/// reconciliation fails. Per-record upsert failures are counted, not
/// propagated.
pub(crate) async fn drive_pass(
    pool: &sqlx::PgPool,
    client: &FeedClient,
    config: &AppConfig,
    options: &ScrapeOptions,
    progress: &mut PassProgress,
) -> anyhow::Result<()> {
    let skip = prepare_pass(pool, options.resume).await?;
    let link_base = client.link_base();
    let batch_pages = config.scrape_batch_pages.max(1);

    let mut batch: Vec<ProductCandidate> = Vec::new();
    let mut page = options.start_page;

    loop {
        if page > options.start_page && config.feed_inter_request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.feed_inter_request_delay_ms)).await;
        }

        let raw_items = client.fetch_page(page).await?;
        progress.pages_fetched = progress.pages_fetched.saturating_add(1);

        if raw_items.is_empty() {
            tracing::info!(final_page = page, "end of pagination");
            break;
        }

        collect_candidates(raw_items, &link_base, &skip, &mut batch);

        // Flush a batch upsert every `batch_pages` pages. Pages full of
        // items that all failed to normalize mean the feed shape changed
        // under us; resumed passes legitimately skip whole windows.
        if (page - options.start_page + 1) % batch_pages == 0 {
            if batch.is_empty() && skip.is_empty() {
                anyhow::bail!("no usable records in the last {batch_pages} pages; aborting pass");
            }
            flush_batch(pool, &mut batch, progress).await;
        }

        page += 1;
    }

    // Upsert the remaining candidates, if any.
    flush_batch(pool, &mut batch, progress).await;

    progress.archived = reconcile_stale(pool, config).await?;
    Ok(())
}

/// Start-of-pass bookkeeping.
///
/// A fresh pass clears the refreshed flag on every live record and skips
/// nothing. A resumed pass keeps the flags from the crashed attempt and
/// skips the records it already committed, so their histories do not get a
/// second append.
async fn prepare_pass(pool: &sqlx::PgPool, resume: bool) -> anyhow::Result<HashSet<i64>> {
    if resume {
        let already_updated: HashSet<i64> = vinpris_db::list_updated_indexes(pool)
            .await?
            .into_iter()
            .collect();
        tracing::info!(
            already_updated = already_updated.len(),
            "resuming pass; skipping records refreshed before the crash"
        );
        Ok(already_updated)
    } else {
        let marked = vinpris_db::mark_all_stale(pool).await?;
        tracing::info!(marked, "marked live records stale for this pass");
        Ok(HashSet::new())
    }
}

/// Normalizes one page of raw items into the batch, skipping keyless items
/// and already-committed indexes.
fn collect_candidates(
    raw_items: Vec<vinpris_scraper::types::RawProduct>,
    link_base: &str,
    skip: &HashSet<i64>,
    batch: &mut Vec<ProductCandidate>,
) {
    for raw in raw_items {
        match vinpris_scraper::normalize_item(raw, link_base) {
            Ok(candidate) => {
                if skip.contains(&candidate.index) {
                    continue;
                }
                batch.push(candidate);
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping item — normalization failed");
            }
        }
    }
}

/// Applies the accumulated batch and folds the outcome into the totals.
/// Failures within the batch never abort the pass.
async fn flush_batch(
    pool: &sqlx::PgPool,
    batch: &mut Vec<ProductCandidate>,
    progress: &mut PassProgress,
) {
    if batch.is_empty() {
        return;
    }

    tracing::info!(records = batch.len(), "flushing batch upsert");
    let outcome = vinpris_db::upsert_batch(pool, batch).await;

    progress.processed = progress
        .processed
        .saturating_add(i32::try_from(outcome.upserted).unwrap_or(i32::MAX));
    progress.failed = progress
        .failed
        .saturating_add(i32::try_from(outcome.failures.len()).unwrap_or(i32::MAX));

    if !outcome.is_clean() {
        tracing::warn!(
            failed = outcome.failures.len(),
            upserted = outcome.upserted,
            "batch finished with per-record failures"
        );
    }

    batch.clear();
}

/// Archives everything the pass did not refresh, unless the stale count is
/// implausibly large — a mostly-failed pass must not empty the catalog.
async fn reconcile_stale(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<i32> {
    let stale = vinpris_db::count_stale(pool).await?;
    let threshold = i64::try_from(config.scrape_stale_threshold).unwrap_or(i64::MAX);

    if stale > threshold {
        tracing::warn!(
            stale,
            threshold,
            "stale count exceeds threshold; skipping archival for this pass"
        );
        return Ok(0);
    }

    let archived = vinpris_db::archive_stale(pool).await?;
    tracing::info!(archived, "archived stale records");
    Ok(i32::try_from(archived).unwrap_or(i32::MAX))
}

//! Scrape command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Per-record failures are logged and counted rather than
//! propagated, so one bad record never aborts a pass; a page fetch that
//! exhausts its retries aborts the rest of the pagination but keeps every
//! batch already committed.

mod pass;

use vinpris_core::AppConfig;

pub(crate) use pass::ScrapeOptions;

/// Print what a pass would do, without touching the network or database.
pub(crate) fn print_dry_run(config: &AppConfig, start_page: u32, resume: bool) {
    println!(
        "dry-run: would scrape {} from page {start_page} (resume: {resume})",
        config.feed_base_url
    );
    println!(
        "dry-run: batch upsert every {} pages, {}ms between pages, {} retries per page",
        config.scrape_batch_pages, config.feed_inter_request_delay_ms, config.feed_max_retries
    );
    println!(
        "dry-run: {} proxy endpoint(s) configured; stale threshold {}",
        config.feed_proxy_urls.len(),
        config.scrape_stale_threshold
    );
}

/// Run a full scrape pass and record its outcome in `scrape_passes`.
///
/// # Errors
///
/// Returns an error if the feed client cannot be constructed, the pass row
/// cannot be created, or the pagination aborts before reaching the end of
/// the feed. Committed batches are kept in all cases.
pub(crate) async fn run_scrape(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    options: ScrapeOptions,
) -> anyhow::Result<()> {
    let proxy_pool = vinpris_scraper::ProxyPool::from_urls(&config.feed_proxy_urls);
    let client = vinpris_scraper::FeedClient::from_app_config(config, proxy_pool)?;

    let row = vinpris_db::create_scrape_pass(pool, "cli").await?;
    if let Err(e) = vinpris_db::start_scrape_pass(pool, row.id).await {
        fail_pass_best_effort(pool, row.id, &pass::PassProgress::default(), &format!("{e:#}")).await;
        return Err(e.into());
    }

    let mut progress = pass::PassProgress::default();
    match pass::drive_pass(pool, &client, config, &options, &mut progress).await {
        Ok(()) => {
            vinpris_db::complete_scrape_pass(
                pool,
                row.id,
                progress.pages_fetched,
                progress.processed,
                progress.failed,
                progress.archived,
            )
            .await?;
            println!(
                "pass {} completed: {} pages, {} records upserted, {} failed, {} archived",
                row.public_id,
                progress.pages_fetched,
                progress.processed,
                progress.failed,
                progress.archived
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                pass_id = row.id,
                pages_fetched = progress.pages_fetched,
                error = %e,
                "scrape pass aborted"
            );
            fail_pass_best_effort(pool, row.id, &progress, &format!("{e:#}")).await;
            Err(e)
        }
    }
}

/// Archive stale records outside a pass, honoring the threshold guard.
///
/// # Errors
///
/// Returns an error if counting or archiving fails, or if the stale count
/// exceeds the configured threshold.
pub(crate) async fn run_reconcile(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let stale = vinpris_db::count_stale(pool).await?;
    println!("stale records: {stale}");

    let threshold = i64::try_from(config.scrape_stale_threshold).unwrap_or(i64::MAX);
    if stale > threshold {
        anyhow::bail!(
            "{stale} stale records exceed the threshold of {threshold}; \
             refusing to archive — run a full pass first"
        );
    }

    let archived = vinpris_db::archive_stale(pool).await?;
    println!("archived {archived} stale records");
    Ok(())
}

/// Record a `failed` status on the pass row on a best-effort basis.
async fn fail_pass_best_effort(
    pool: &sqlx::PgPool,
    pass_id: i64,
    progress: &pass::PassProgress,
    error_message: &str,
) {
    if let Err(mark_err) = vinpris_db::fail_scrape_pass(
        pool,
        pass_id,
        progress.pages_fetched,
        progress.processed,
        error_message,
    )
    .await
    {
        tracing::error!(
            pass_id,
            error = %mark_err,
            "failed to record pass failure"
        );
    }
}

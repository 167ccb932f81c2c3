use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Root of the retailer's product-search API, without a trailing slash.
    pub feed_base_url: String,
    /// Proxy endpoints for feed requests, typically with embedded
    /// credentials. Empty means fetch directly.
    pub feed_proxy_urls: Vec<String>,
    pub feed_request_timeout_secs: u64,
    pub feed_user_agent: String,
    pub feed_max_retries: u32,
    pub feed_retry_backoff_base_secs: u64,
    pub feed_inter_request_delay_ms: u64,
    /// Flush a batch upsert after this many pages.
    pub scrape_batch_pages: u32,
    /// Refuse to archive stale records when more than this many are left
    /// after a pass. A huge stale count means the pass went wrong, not that
    /// the retailer delisted half its catalog.
    pub scrape_stale_threshold: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("feed_base_url", &self.feed_base_url)
            // Proxy URLs carry credentials; log the count only.
            .field("feed_proxy_urls", &format!("[{} redacted]", self.feed_proxy_urls.len()))
            .field("feed_request_timeout_secs", &self.feed_request_timeout_secs)
            .field("feed_user_agent", &self.feed_user_agent)
            .field("feed_max_retries", &self.feed_max_retries)
            .field(
                "feed_retry_backoff_base_secs",
                &self.feed_retry_backoff_base_secs,
            )
            .field(
                "feed_inter_request_delay_ms",
                &self.feed_inter_request_delay_ms,
            )
            .field("scrape_batch_pages", &self.scrape_batch_pages)
            .field("scrape_stale_threshold", &self.scrape_stale_threshold)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

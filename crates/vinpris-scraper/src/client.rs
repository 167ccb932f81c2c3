use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::proxy::ProxyPool;
use crate::rate_limit::retry_with_backoff;
use crate::types::{RawProduct, SearchResponse};

/// Maximum page index to request before returning an error.
/// Prevents infinite loops if the feed never returns an empty page.
pub const MAX_PAGES: u32 = 10_000;

/// HTTP client for the retailer's paginated product-search endpoint.
///
/// Pagination is by page number: the caller advances `currentPage` by one
/// per call and stops at the first empty product list. Rate limiting (429),
/// gateway hiccups (502/503), not-found (404), and other non-2xx responses
/// come back as typed errors; transient ones are automatically retried with
/// exponential backoff up to `max_retries` additional attempts.
///
/// Requests rotate through the injected [`ProxyPool`]; an endpoint that
/// fails at the connection level is evicted from the pool and the retry
/// proceeds on the next one (or directly once the pool is exhausted).
pub struct FeedClient {
    direct: Client,
    /// One pre-built client per proxy endpoint, keyed by endpoint id.
    proxied: HashMap<usize, Client>,
    pool: ProxyPool,
    base_url: String,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

/// Extracts the scheme+host origin from the feed base URL.
///
/// Given `"https://shop.example.com/api/v2"`, returns
/// `"https://shop.example.com"`. Product URLs in the feed are relative to
/// the site root, not the API root, so the normalizer links against this.
#[must_use]
pub fn extract_feed_origin(base_url: &str) -> String {
    reqwest::Url::parse(base_url).map_or_else(
        |_| {
            // fallback: take "https://host" by splitting on '/' and taking first 3 parts
            base_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

impl FeedClient {
    /// Creates a `FeedClient` with configured timeout, `User-Agent`, retry
    /// policy, and proxy pool.
    ///
    /// `max_retries` is the number of additional attempts after the first
    /// failure for transient errors. Set to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config or proxy URL).
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
        pool: ProxyPool,
    ) -> Result<Self, ScraperError> {
        let builder = || {
            Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .user_agent(user_agent)
        };

        let direct = builder().build()?;

        let mut proxied = HashMap::new();
        for endpoint in pool.endpoints() {
            let proxy = reqwest::Proxy::all(endpoint.url.as_str())?;
            let client = builder().proxy(proxy).build()?;
            proxied.insert(endpoint.id, client);
        }

        Ok(Self {
            direct,
            proxied,
            pool,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Creates a `FeedClient` from application configuration.
    ///
    /// # Errors
    ///
    /// Same as [`FeedClient::new`].
    pub fn from_app_config(
        config: &vinpris_core::AppConfig,
        pool: ProxyPool,
    ) -> Result<Self, ScraperError> {
        Self::new(
            &config.feed_base_url,
            config.feed_request_timeout_secs,
            &config.feed_user_agent,
            config.feed_max_retries,
            config.feed_retry_backoff_base_secs,
            pool,
        )
    }

    /// The site origin for absolutizing the feed's relative product URLs.
    #[must_use]
    pub fn link_base(&self) -> String {
        extract_feed_origin(&self.base_url)
    }

    /// Fetches one page of the product search, with automatic retry on
    /// transient errors.
    ///
    /// Returns the raw items of that page; an empty vector means the end of
    /// pagination. Each attempt takes the next proxy from the pool; a
    /// connection-level failure evicts that proxy before the error enters
    /// the retry loop.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::PaginationLimit`] — `page` exceeds [`MAX_PAGES`].
    /// - [`ScraperError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ScraperError::Unavailable`] — HTTP 502/503 after all retries exhausted.
    /// - [`ScraperError::NotFound`] — HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`] — any other non-2xx status (not retried).
    /// - [`ScraperError::Http`] — network or TLS failure after all retries exhausted.
    /// - [`ScraperError::Deserialize`] — response body is not valid JSON or
    ///   does not match the expected shape (not retried).
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<RawProduct>, ScraperError> {
        if page >= MAX_PAGES {
            return Err(ScraperError::PaginationLimit {
                max_pages: MAX_PAGES,
            });
        }

        let url = self.search_url(page);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let endpoint = self.pool.next();
                let client = endpoint
                    .as_ref()
                    .and_then(|e| self.proxied.get(&e.id))
                    .unwrap_or(&self.direct);

                let response = match client.get(&url).send().await {
                    Ok(response) => response,
                    Err(e) => {
                        // A connect-level failure is the proxy's fault, not
                        // the feed's; drop it from rotation before retrying.
                        if e.is_connect() || e.is_timeout() {
                            if let Some(endpoint) = &endpoint {
                                self.pool.mark_failed(endpoint.id);
                            }
                        }
                        return Err(ScraperError::Http(e));
                    }
                };

                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);

                    return Err(ScraperError::RateLimited { retry_after_secs });
                }

                if status == reqwest::StatusCode::BAD_GATEWAY
                    || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
                {
                    return Err(ScraperError::Unavailable {
                        status: status.as_u16(),
                        url,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                let parsed = serde_json::from_str::<SearchResponse>(&body).map_err(|e| {
                    ScraperError::Deserialize {
                        context: format!("search page {page}"),
                        source: e,
                    }
                })?;

                Ok(parsed
                    .product_search_result
                    .map(|result| result.products)
                    .unwrap_or_default())
            }
        })
        .await
    }

    /// Builds the search URL for the given page.
    ///
    /// The query string is a fixed template; only the page number varies.
    fn search_url(&self, page: u32) -> String {
        format!(
            "{}/search?fields=FULL&searchType=product&currentPage={page}&q=%3Arelevance",
            self.base_url
        )
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

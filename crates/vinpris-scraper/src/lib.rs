pub mod client;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod proxy;
mod rate_limit;
pub mod types;

pub use client::{extract_feed_origin, FeedClient, MAX_PAGES};
pub use error::ScraperError;
pub use normalize::normalize_item;
pub use proxy::{ProxyEndpoint, ProxyPool};

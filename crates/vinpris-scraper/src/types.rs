//! Raw response types for the retailer's product-search endpoint.
//!
//! ## Observed shape
//!
//! The feed wraps everything in optional nested objects and is inconsistent
//! about presence: a delisted product may omit `price` entirely, `volume`
//! may be present with a `null` value, and descriptive objects
//! (`main_category`, `district`, ...) appear only when the attribute is
//! known. Every field here is `#[serde(default)]` so an absent path
//! deserializes rather than failing the page.
//!
//! ### Field-name quirks
//! The search API mixes snake_case (`main_category`, `main_country`) with
//! camelCase (`productAvailability`) and one hybrid: the sub-district key is
//! spelled `sub_District`, capital D. The renames below pin the observed
//! spellings rather than relying on a container-wide rename rule.
//!
//! ### `year`
//! Returned as a number for some products and a string (`"2019"`) for
//! others. Modeled as a raw JSON value and coerced during normalization.
//!
//! ### Alcohol strength
//! Not a structured field. It arrives as an entry in `traits` with
//! `name = "Alkohol"` and a localized readable value like `"12,5 prosent"`;
//! extraction is done in `parse.rs`.

use serde::Deserialize;

/// Top-level response from `GET /search`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default, rename = "productSearchResult")]
    pub product_search_result: Option<SearchResult>,
}

/// The paginated result set; an empty `products` list signals the end of
/// pagination.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub products: Vec<RawProduct>,
}

/// A single product item exactly as the feed serves it.
#[derive(Debug, Default, Deserialize)]
pub struct RawProduct {
    /// Product code; numeric in practice but transmitted as a string.
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// Relative URL to the product page (e.g. `"/p/1234501"`).
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub price: Option<RawValue>,

    /// Container volume in centiliters.
    #[serde(default)]
    pub volume: Option<RawValue>,

    /// Vintage year; number or string depending on the product.
    #[serde(default)]
    pub year: Option<serde_json::Value>,

    #[serde(default)]
    pub main_category: Option<RawNamed>,

    #[serde(default)]
    pub main_sub_category: Option<RawNamed>,

    #[serde(default)]
    pub main_country: Option<RawNamed>,

    #[serde(default)]
    pub district: Option<RawNamed>,

    /// Capital D as served by the feed.
    #[serde(default, rename = "sub_District")]
    pub sub_district: Option<RawNamed>,

    #[serde(default)]
    pub buyable: Option<bool>,

    /// Feed lifecycle tag, e.g. `"active"` or `"expired"`.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, rename = "productAvailability")]
    pub product_availability: Option<RawAvailability>,

    /// Loose name/readable-value pairs; carries alcohol strength.
    #[serde(default)]
    pub traits: Vec<RawTrait>,
}

/// A `{ "value": ... }` wrapper around a numeric attribute.
#[derive(Debug, Default, Deserialize)]
pub struct RawValue {
    #[serde(default)]
    pub value: Option<f64>,
}

/// A `{ "name": ... }` wrapper around a descriptive attribute.
#[derive(Debug, Default, Deserialize)]
pub struct RawNamed {
    #[serde(default)]
    pub name: Option<String>,
}

/// Per-channel availability of a product.
#[derive(Debug, Default, Deserialize)]
pub struct RawAvailability {
    #[serde(default, rename = "deliveryAvailability")]
    pub delivery: Option<RawChannel>,

    #[serde(default, rename = "storesAvailability")]
    pub stores: Option<RawChannel>,
}

/// One availability channel.
#[derive(Debug, Default, Deserialize)]
pub struct RawChannel {
    #[serde(default, rename = "availableForPurchase")]
    pub available_for_purchase: Option<bool>,
}

/// A loose attribute from the feed's `traits` list.
#[derive(Debug, Default, Deserialize)]
pub struct RawTrait {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "readableValue")]
    pub readable_value: Option<String>,
}

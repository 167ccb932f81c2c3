//! Normalization from raw feed items to [`vinpris_core::ProductCandidate`].
//!
//! Absence is normalized, never raised: every optional nested path collapses
//! to the field's default (`None`, `false`, `0.0`). The one hard requirement
//! is the product code — a record without a parseable code has no key and
//! cannot be upserted, so it is the single error case and the caller skips
//! the item.

use vinpris_core::ProductCandidate;

use crate::error::ScraperError;
use crate::parse::{parse_alcohol_strength, parse_year};
use crate::types::{RawProduct, RawTrait};

/// Trait name the feed uses for alcohol strength.
const ALCOHOL_TRAIT: &str = "Alkohol";

/// Normalizes one raw feed item into a [`ProductCandidate`].
///
/// `link_base` is the site origin used to absolutize the feed's relative
/// product URLs (see [`crate::client::extract_feed_origin`]).
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] if the product code is missing
/// or not numeric. All other absence is defaulted, never an error.
pub fn normalize_item(
    product: RawProduct,
    link_base: &str,
) -> Result<ProductCandidate, ScraperError> {
    let index = product
        .code
        .as_deref()
        .and_then(|code| code.trim().parse::<i64>().ok())
        .ok_or_else(|| ScraperError::Normalization {
            code: product.code.clone(),
            reason: "product code is missing or not numeric".into(),
        })?;

    let price = product.price.and_then(|p| p.value).unwrap_or(0.0);
    let volume = product.volume.and_then(|v| v.value).unwrap_or(0.0);
    let alcohol = extract_alcohol(&product.traits);
    let year = parse_year(product.year.as_ref());

    let url = product
        .url
        .map(|path| format!("{}{}", link_base.trim_end_matches('/'), path));

    let availability = product.product_availability;
    let orderable = availability
        .as_ref()
        .and_then(|a| a.delivery.as_ref())
        .and_then(|c| c.available_for_purchase)
        .unwrap_or(false);
    let in_stores = availability
        .as_ref()
        .and_then(|a| a.stores.as_ref())
        .and_then(|c| c.available_for_purchase)
        .unwrap_or(false);

    Ok(ProductCandidate {
        index,
        name: product.name,
        category: product.main_category.and_then(|c| c.name),
        subcategory: product.main_sub_category.and_then(|c| c.name),
        country: product.main_country.and_then(|c| c.name),
        district: product.district.and_then(|d| d.name),
        subdistrict: product.sub_district.and_then(|d| d.name),
        url,
        price,
        volume,
        alcohol,
        year,
        buyable: product.buyable.unwrap_or(false),
        orderable,
        in_stores,
        status: product.status,
    })
}

/// Pulls alcohol strength out of the traits list.
///
/// `None` when the trait is absent or its readable value carries no number;
/// `Some(0.0)` when the feed explicitly reports a non-alcoholic product.
fn extract_alcohol(traits: &[RawTrait]) -> Option<f64> {
    traits
        .iter()
        .find(|t| t.name.as_deref() == Some(ALCOHOL_TRAIT))
        .and_then(|t| t.readable_value.as_deref())
        .and_then(parse_alcohol_strength)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK_BASE: &str = "https://shop.example.com";

    fn raw_from_json(json: serde_json::Value) -> RawProduct {
        serde_json::from_value(json).expect("raw product should deserialize")
    }

    fn full_item() -> serde_json::Value {
        serde_json::json!({
            "code": "1234501",
            "name": "Amarone della Valpolicella",
            "url": "/p/1234501",
            "price": { "value": 349.9 },
            "volume": { "value": 75.0 },
            "year": "2019",
            "main_category": { "name": "Rødvin" },
            "main_sub_category": { "name": "Amarone" },
            "main_country": { "name": "Italia" },
            "district": { "name": "Veneto" },
            "sub_District": { "name": "Valpolicella" },
            "buyable": true,
            "status": "active",
            "productAvailability": {
                "deliveryAvailability": { "availableForPurchase": true },
                "storesAvailability": { "availableForPurchase": false }
            },
            "traits": [
                { "name": "Sukker", "readableValue": "6 gram per liter" },
                { "name": "Alkohol", "readableValue": "15,0 prosent" }
            ]
        })
    }

    #[test]
    fn full_item_maps_every_field() {
        let candidate = normalize_item(raw_from_json(full_item()), LINK_BASE).unwrap();
        assert_eq!(candidate.index, 1_234_501);
        assert_eq!(candidate.name.as_deref(), Some("Amarone della Valpolicella"));
        assert_eq!(candidate.category.as_deref(), Some("Rødvin"));
        assert_eq!(candidate.subcategory.as_deref(), Some("Amarone"));
        assert_eq!(candidate.country.as_deref(), Some("Italia"));
        assert_eq!(candidate.district.as_deref(), Some("Veneto"));
        assert_eq!(candidate.subdistrict.as_deref(), Some("Valpolicella"));
        assert_eq!(
            candidate.url.as_deref(),
            Some("https://shop.example.com/p/1234501")
        );
        assert!((candidate.price - 349.9).abs() < f64::EPSILON);
        assert!((candidate.volume - 75.0).abs() < f64::EPSILON);
        assert_eq!(candidate.alcohol, Some(15.0));
        assert_eq!(candidate.year, Some(2019));
        assert!(candidate.buyable);
        assert!(candidate.orderable);
        assert!(!candidate.in_stores);
        assert_eq!(candidate.status.as_deref(), Some("active"));
    }

    #[test]
    fn empty_item_defaults_every_optional_field() {
        let candidate =
            normalize_item(raw_from_json(serde_json::json!({ "code": "77" })), LINK_BASE).unwrap();
        assert_eq!(candidate.index, 77);
        assert!(candidate.name.is_none());
        assert!(candidate.category.is_none());
        assert!(candidate.country.is_none());
        assert!(candidate.url.is_none());
        assert!((candidate.price - 0.0).abs() < f64::EPSILON);
        assert!((candidate.volume - 0.0).abs() < f64::EPSILON);
        assert!(candidate.alcohol.is_none());
        assert!(candidate.year.is_none());
        assert!(!candidate.buyable);
        assert!(!candidate.orderable);
        assert!(!candidate.in_stores);
        assert!(candidate.status.is_none());
    }

    #[test]
    fn price_object_with_null_value_defaults_to_zero() {
        let candidate = normalize_item(
            raw_from_json(serde_json::json!({ "code": "5", "price": { "value": null } })),
            LINK_BASE,
        )
        .unwrap();
        assert!((candidate.price - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_code_is_the_only_error() {
        let err = normalize_item(raw_from_json(serde_json::json!({})), LINK_BASE).unwrap_err();
        assert!(matches!(err, ScraperError::Normalization { code: None, .. }));
    }

    #[test]
    fn non_numeric_code_is_rejected() {
        let err = normalize_item(
            raw_from_json(serde_json::json!({ "code": "VINTAGE-99" })),
            LINK_BASE,
        )
        .unwrap_err();
        assert!(
            matches!(err, ScraperError::Normalization { code: Some(ref c), .. } if c == "VINTAGE-99")
        );
    }

    #[test]
    fn code_with_surrounding_whitespace_parses() {
        let candidate = normalize_item(
            raw_from_json(serde_json::json!({ "code": " 42 " })),
            LINK_BASE,
        )
        .unwrap();
        assert_eq!(candidate.index, 42);
    }

    #[test]
    fn alcohol_trait_zero_is_explicit_not_unknown() {
        let candidate = normalize_item(
            raw_from_json(serde_json::json!({
                "code": "9",
                "traits": [{ "name": "Alkohol", "readableValue": "0 prosent" }]
            })),
            LINK_BASE,
        )
        .unwrap();
        assert_eq!(candidate.alcohol, Some(0.0));
    }

    #[test]
    fn unreadable_alcohol_trait_is_unknown() {
        let candidate = normalize_item(
            raw_from_json(serde_json::json!({
                "code": "9",
                "traits": [{ "name": "Alkohol", "readableValue": "ukjent" }]
            })),
            LINK_BASE,
        )
        .unwrap();
        assert!(candidate.alcohol.is_none());
    }

    #[test]
    fn link_base_trailing_slash_is_collapsed() {
        let candidate = normalize_item(
            raw_from_json(serde_json::json!({ "code": "8", "url": "/p/8" })),
            "https://shop.example.com/",
        )
        .unwrap();
        assert_eq!(candidate.url.as_deref(), Some("https://shop.example.com/p/8"));
    }

    #[test]
    fn numeric_year_is_accepted() {
        let candidate = normalize_item(
            raw_from_json(serde_json::json!({ "code": "3", "year": 2015 })),
            LINK_BASE,
        )
        .unwrap();
        assert_eq!(candidate.year, Some(2015));
    }
}

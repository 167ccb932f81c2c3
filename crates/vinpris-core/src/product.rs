use serde::{Deserialize, Serialize};

/// A product scraped from the retailer's search feed, normalized into the
/// canonical shape shared by the upsert engine and the read surface.
///
/// Candidates carry only normalizer-supplied fields. `old_price`,
/// `price_history`, and the derived price fields are owned by the upsert
/// step and never set from feed data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCandidate {
    /// The feed's numeric product code; the primary key for upserts.
    /// Stable for the lifetime of the product.
    pub index: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub country: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    /// Absolute URL to the product page, when the feed provides one.
    pub url: Option<String>,
    /// Current price in the feed's currency. `0.0` means unknown or not
    /// orderable, never a real zero price.
    pub price: f64,
    /// Container volume in centiliters. `0.0` means unknown.
    pub volume: f64,
    /// Alcohol strength in percent. `Some(0.0)` is explicitly non-alcoholic;
    /// `None` is unknown.
    pub alcohol: Option<f64>,
    /// Vintage year, for the products that have one.
    pub year: Option<i32>,
    pub buyable: bool,
    /// Available for home delivery.
    pub orderable: bool,
    /// Available in at least one physical store.
    pub in_stores: bool,
    /// Feed-reported lifecycle tag (e.g. `"active"`, `"expired"`).
    pub status: Option<String>,
}

impl ProductCandidate {
    /// Returns `true` if the feed reported a usable (positive) price.
    #[must_use]
    pub fn has_known_price(&self) -> bool {
        self.price > 0.0
    }

    /// Returns `true` if the product can be obtained through any channel.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.buyable || self.orderable || self.in_stores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candidate(price: f64) -> ProductCandidate {
        ProductCandidate {
            index: 1_234_501,
            name: Some("Amarone della Valpolicella".to_string()),
            category: Some("Rødvin".to_string()),
            subcategory: None,
            country: Some("Italia".to_string()),
            district: Some("Veneto".to_string()),
            subdistrict: None,
            url: Some("https://example.com/p/1234501".to_string()),
            price,
            volume: 75.0,
            alcohol: Some(15.0),
            year: Some(2019),
            buyable: true,
            orderable: true,
            in_stores: false,
            status: Some("active".to_string()),
        }
    }

    #[test]
    fn has_known_price_true_for_positive_price() {
        assert!(make_candidate(349.9).has_known_price());
    }

    #[test]
    fn has_known_price_false_for_zero_price() {
        assert!(!make_candidate(0.0).has_known_price());
    }

    #[test]
    fn is_purchasable_when_any_channel_is_open() {
        let mut candidate = make_candidate(349.9);
        assert!(candidate.is_purchasable());

        candidate.buyable = false;
        candidate.orderable = false;
        candidate.in_stores = false;
        assert!(!candidate.is_purchasable());

        candidate.in_stores = true;
        assert!(candidate.is_purchasable());
    }

    #[test]
    fn serde_roundtrip_candidate() {
        let candidate = make_candidate(349.9);
        let json = serde_json::to_string(&candidate).expect("serialization failed");
        let decoded: ProductCandidate =
            serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(decoded.index, candidate.index);
        assert_eq!(decoded.name, candidate.name);
        assert_eq!(decoded.alcohol, candidate.alcohol);
        assert_eq!(decoded.year, candidate.year);
    }
}

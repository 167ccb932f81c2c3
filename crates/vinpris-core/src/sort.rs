use std::str::FromStr;

use thiserror::Error;

/// Sort keys accepted by the product listing.
///
/// Runtime sort selection goes through this enum rather than splicing a
/// caller-supplied field name into the query: unknown keys are rejected at
/// the boundary with [`SortKeyParseError`], and [`SortKey::column`] is the
/// only mapping from key to column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Price,
    /// Period-over-period price change. The default: ascending puts the
    /// biggest price drops first.
    #[default]
    Discount,
    LiterPrice,
    AlcoholPrice,
    Name,
    Volume,
    Alcohol,
}

impl SortKey {
    /// The column this key sorts by. Fixed table; no dynamic lookup.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            SortKey::Price => "price",
            SortKey::Discount => "discount_percent",
            SortKey::LiterPrice => "liter_price",
            SortKey::AlcoholPrice => "alcohol_price",
            SortKey::Name => "name",
            SortKey::Volume => "volume",
            SortKey::Alcohol => "alcohol",
        }
    }
}

/// Rejected sort key, surfaced to API callers as a bad request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sort key: {0:?}")]
pub struct SortKeyParseError(pub String);

impl FromStr for SortKey {
    type Err = SortKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(SortKey::Price),
            "discount" => Ok(SortKey::Discount),
            "liter-price" => Ok(SortKey::LiterPrice),
            "alcohol-price" => Ok(SortKey::AlcoholPrice),
            "name" => Ok(SortKey::Name),
            "volume" => Ok(SortKey::Volume),
            "alcohol" => Ok(SortKey::Alcohol),
            other => Err(SortKeyParseError(other.to_string())),
        }
    }
}

/// Sort direction for the listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// SQL direction keyword for this order.
    #[must_use]
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = SortKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            other => Err(SortKeyParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_parses_back_from_its_wire_name() {
        for (wire, key) in [
            ("price", SortKey::Price),
            ("discount", SortKey::Discount),
            ("liter-price", SortKey::LiterPrice),
            ("alcohol-price", SortKey::AlcoholPrice),
            ("name", SortKey::Name),
            ("volume", SortKey::Volume),
            ("alcohol", SortKey::Alcohol),
        ] {
            assert_eq!(wire.parse::<SortKey>().unwrap(), key);
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = "priceHistory".parse::<SortKey>().unwrap_err();
        assert_eq!(err, SortKeyParseError("priceHistory".to_string()));
    }

    #[test]
    fn key_with_sql_injection_attempt_is_rejected() {
        assert!("price; DROP TABLE products".parse::<SortKey>().is_err());
    }

    #[test]
    fn default_sort_is_discount_ascending() {
        assert_eq!(SortKey::default(), SortKey::Discount);
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
    }

    #[test]
    fn columns_are_known_schema_columns() {
        for key in [
            SortKey::Price,
            SortKey::Discount,
            SortKey::LiterPrice,
            SortKey::AlcoholPrice,
            SortKey::Name,
            SortKey::Volume,
            SortKey::Alcohol,
        ] {
            assert!(!key.column().is_empty());
            assert!(key.column().chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn order_parses_and_maps_to_sql() {
        assert_eq!("asc".parse::<SortOrder>().unwrap().sql(), "ASC");
        assert_eq!("desc".parse::<SortOrder>().unwrap().sql(), "DESC");
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}

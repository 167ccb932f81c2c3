//! Derived price computation.
//!
//! This is the single formula set shared by inserts and updates: the SQL
//! upsert in `vinpris-db` encodes the same expressions on its conflict arm,
//! and feeds fresh inserts through these functions, so a record derived at
//! creation is indistinguishable from one derived on its hundredth refresh.
//!
//! All three derivations tolerate zero, negative, and unknown inputs without
//! dividing by them: a non-positive divisor always yields the documented
//! fallback (`0` for the discount, `None` for the unit prices).

/// Derived price fields for one record, recomputed in full at every upsert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedPrices {
    /// Period-over-period price change in percent. Negative means the price
    /// dropped since the previous pass.
    pub discount_percent: f64,
    /// Price per liter. `None` when price or volume is unknown.
    pub liter_price: Option<f64>,
    /// Price per liter per alcohol percent. `None` when the liter price or
    /// the alcohol strength is unknown or zero.
    pub alcohol_price: Option<f64>,
}

/// Price change from `old_price` to `price`, in percent.
///
/// Defined as `(price - old) / old * 100` when both prices are known and
/// positive. Any unknown or non-positive input yields `0`: a product seen
/// for the first time, delisted (`price = 0`), or relisted after a gap has
/// no meaningful period-over-period change.
#[must_use]
pub fn discount_percent(old_price: Option<f64>, price: f64) -> f64 {
    match old_price {
        Some(old) if old > 0.0 && price > 0.0 => (price - old) / old * 100.0,
        _ => 0.0,
    }
}

/// Price per liter, from a price and a volume in centiliters.
///
/// `price / volume * 100` when both are positive; `None` otherwise.
#[must_use]
pub fn liter_price(price: f64, volume: f64) -> Option<f64> {
    if price > 0.0 && volume > 0.0 {
        Some(price / volume * 100.0)
    } else {
        None
    }
}

/// Price per liter per alcohol percent.
///
/// `liter_price / alcohol` when the liter price is known and positive and
/// the strength is known and positive; `None` otherwise. An explicitly
/// non-alcoholic product (`Some(0.0)`) has no alcohol price, same as an
/// unknown one.
#[must_use]
pub fn alcohol_price(liter_price: Option<f64>, alcohol: Option<f64>) -> Option<f64> {
    match (liter_price, alcohol) {
        (Some(lp), Some(alc)) if lp > 0.0 && alc > 0.0 => Some(lp / alc),
        _ => None,
    }
}

/// Computes all three derived fields for one upsert.
#[must_use]
pub fn derive_prices(
    old_price: Option<f64>,
    price: f64,
    volume: f64,
    alcohol: Option<f64>,
) -> DerivedPrices {
    let lp = liter_price(price, volume);
    DerivedPrices {
        discount_percent: discount_percent(old_price, price),
        liter_price: lp,
        alcohol_price: alcohol_price(lp, alcohol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    // -----------------------------------------------------------------------
    // discount_percent
    // -----------------------------------------------------------------------

    #[test]
    fn discount_is_zero_without_prior_price() {
        assert_close(discount_percent(None, 100.0), 0.0);
    }

    #[test]
    fn discount_is_zero_when_prior_price_is_zero() {
        assert_close(discount_percent(Some(0.0), 100.0), 0.0);
    }

    #[test]
    fn discount_is_zero_when_new_price_is_zero() {
        assert_close(discount_percent(Some(50.0), 0.0), 0.0);
    }

    #[test]
    fn discount_positive_on_price_increase() {
        assert_close(discount_percent(Some(100.0), 110.0), 10.0);
    }

    #[test]
    fn discount_negative_on_price_drop() {
        assert_close(discount_percent(Some(200.0), 150.0), -25.0);
    }

    #[test]
    fn discount_is_zero_when_price_unchanged() {
        // Re-upserting identical data must read as "no change".
        assert_close(discount_percent(Some(129.9), 129.9), 0.0);
    }

    // -----------------------------------------------------------------------
    // liter_price
    // -----------------------------------------------------------------------

    #[test]
    fn liter_price_normalizes_centiliters() {
        let lp = liter_price(110.0, 75.0).expect("expected a liter price");
        assert_close(lp, 146.666_666_666_666_66);
    }

    #[test]
    fn liter_price_none_when_volume_is_zero() {
        assert!(liter_price(200.0, 0.0).is_none());
    }

    #[test]
    fn liter_price_none_when_price_is_zero() {
        assert!(liter_price(0.0, 50.0).is_none());
    }

    // -----------------------------------------------------------------------
    // alcohol_price
    // -----------------------------------------------------------------------

    #[test]
    fn alcohol_price_divides_liter_price_by_strength() {
        let ap = alcohol_price(Some(146.666_666_666_666_66), Some(13.5))
            .expect("expected an alcohol price");
        assert_close(ap, 10.864_197_530_864_19);
    }

    #[test]
    fn alcohol_price_none_without_liter_price() {
        assert!(alcohol_price(None, Some(13.5)).is_none());
    }

    #[test]
    fn alcohol_price_none_for_non_alcoholic_product() {
        assert!(alcohol_price(Some(100.0), Some(0.0)).is_none());
    }

    #[test]
    fn alcohol_price_none_for_unknown_strength() {
        assert!(alcohol_price(Some(100.0), None).is_none());
    }

    // -----------------------------------------------------------------------
    // derive_prices: full edge-case grid. No combination of zero/unknown
    // inputs may panic, and each falls into the documented bucket.
    // -----------------------------------------------------------------------

    #[test]
    fn derivation_never_panics_over_the_full_input_grid() {
        let old_prices = [None, Some(0.0), Some(100.0)];
        let prices = [0.0, 110.0];
        let volumes = [0.0, 75.0];
        let alcohols = [None, Some(0.0), Some(13.5)];

        for old in old_prices {
            for price in prices {
                for volume in volumes {
                    for alcohol in alcohols {
                        let derived = derive_prices(old, price, volume, alcohol);

                        if old.is_some_and(|o| o > 0.0) && price > 0.0 {
                            // Only (old=100, price=110) reaches this branch.
                            assert_close(derived.discount_percent, 10.0);
                        } else {
                            assert_close(derived.discount_percent, 0.0);
                        }

                        if price > 0.0 && volume > 0.0 {
                            assert!(derived.liter_price.is_some());
                        } else {
                            assert!(derived.liter_price.is_none());
                        }

                        if derived.liter_price.is_some() && alcohol.is_some_and(|a| a > 0.0) {
                            assert!(derived.alcohol_price.is_some());
                        } else {
                            assert!(derived.alcohol_price.is_none());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn worked_example_updated_record() {
        // Stored price 100, fresh candidate 110 at 75cl / 13.5%.
        let derived = derive_prices(Some(100.0), 110.0, 75.0, Some(13.5));
        assert_close(derived.discount_percent, 10.0);
        assert_close(derived.liter_price.unwrap(), 146.666_666_666_666_66);
        assert_close(derived.alcohol_price.unwrap(), 10.864_197_530_864_19);
    }

    #[test]
    fn worked_example_delisted_record() {
        // Price reported as 0 over a stored price of 50: no discount, no
        // unit prices.
        let derived = derive_prices(Some(50.0), 0.0, 50.0, None);
        assert_close(derived.discount_percent, 0.0);
        assert!(derived.liter_price.is_none());
        assert!(derived.alcohol_price.is_none());
    }

    #[test]
    fn worked_example_fresh_insert_without_volume() {
        let derived = derive_prices(None, 200.0, 0.0, Some(40.0));
        assert_close(derived.discount_percent, 0.0);
        assert!(derived.liter_price.is_none());
        assert!(derived.alcohol_price.is_none());
    }
}

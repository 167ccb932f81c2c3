//! Best-effort extraction of loosely-typed feed attributes.

use regex::Regex;

/// Parses alcohol strength in percent from a trait's readable value.
///
/// The feed renders strength as a localized string with either comma or dot
/// as the decimal separator: `"12,5 prosent"`, `"4.7 %"`, `"0 prosent"`.
/// Returns `None` when no leading number is present; `Some(0.0)` is a valid
/// result for explicitly non-alcoholic products.
#[must_use]
pub fn parse_alcohol_strength(readable: &str) -> Option<f64> {
    let pattern = Regex::new(r"^\s*(\d+(?:[.,]\d+)?)").expect("valid regex");
    let captures = pattern.captures(readable)?;
    let number = captures.get(1)?.as_str().replace(',', ".");
    number.parse::<f64>().ok()
}

/// Coerces the feed's `year` value into an integer.
///
/// The feed sends a number for some products and a string for others, and
/// the string is occasionally a float rendering (`"2019.0"`). Anything
/// non-coercible is treated as unknown.
#[must_use]
pub fn parse_year(value: Option<&serde_json::Value>) -> Option<i32> {
    let value = value?;
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    if let Some(f) = value.as_f64() {
        return float_to_year(f);
    }
    if let Some(s) = value.as_str() {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i32>() {
            return Some(n);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return float_to_year(f);
        }
    }
    None
}

fn float_to_year(f: f64) -> Option<i32> {
    if f.is_finite() && f >= 0.0 && f < f64::from(i32::MAX) {
        #[allow(clippy::cast_possible_truncation)] // bounds checked above
        Some(f as i32)
    } else {
        None
    }
}

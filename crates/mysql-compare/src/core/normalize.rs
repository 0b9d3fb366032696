//! Value normalization for cross-instance equality.
//!
//! Both instances run the same engine, yet the same logical value can still
//! arrive in different representations (a `DECIMAL` default written as `2.00`
//! vs `2`, a `NaN` stored where the other side has `NULL`, an unsigned and a
//! signed integer column). Every equality check in the comparators goes through
//! [`normalize_value`] so those differences never surface as diffs.
//!
//! Rules:
//! - `NULL` and floating-point `NaN` are null-equivalent. Two null-equivalent
//!   values are equal.
//! - Booleans become the integers `0` / `1`.
//! - Integers of every width and signedness unify into one integer domain.
//! - Decimals and finite floats become exact decimals with trailing zeros
//!   stripped; a decimal without fractional part collapses to an integer, so
//!   `2`, `2.0` and `2.00` are equal. Infinite floats keep a textual form.
//! - Text is compared verbatim: no trimming, no case folding, and no numeric
//!   coercion (`"01"` and `1` differ).
//! - Dates, times and timestamps render to canonical ISO text, UUIDs to
//!   lowercase hyphenated text.
//! - Bytes compare byte-wise.

use rust_decimal::Decimal;

use super::value::SqlValue;

/// Canonical representation used for equality, hashing and ordering.
///
/// Variant order defines the cross-type sort order of row keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NormalizedValue {
    /// Null-equivalent (`NULL`, `NaN`).
    Null,
    /// Integral number.
    Integer(i128),
    /// Exact number with a non-zero fractional part.
    Decimal(Decimal),
    /// Text and text-rendered values.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl NormalizedValue {
    /// Whether this value is null-equivalent.
    pub fn is_null(&self) -> bool {
        matches!(self, NormalizedValue::Null)
    }
}

/// Normalize a fetched value according to the module rules.
pub fn normalize_value(value: &SqlValue) -> NormalizedValue {
    match value {
        SqlValue::Null => NormalizedValue::Null,
        SqlValue::Bool(v) => NormalizedValue::Integer(i128::from(*v as u8)),
        SqlValue::Int(v) => NormalizedValue::Integer(i128::from(*v)),
        SqlValue::UInt(v) => NormalizedValue::Integer(i128::from(*v)),
        SqlValue::Float(v) => normalize_float(*v),
        SqlValue::Decimal(v) => normalize_decimal(*v),
        SqlValue::Text(v) => NormalizedValue::Text(v.clone()),
        SqlValue::Bytes(v) => NormalizedValue::Bytes(v.clone()),
        SqlValue::Uuid(v) => NormalizedValue::Text(v.hyphenated().to_string()),
        SqlValue::Date(v) => NormalizedValue::Text(v.format("%Y-%m-%d").to_string()),
        SqlValue::Time(v) => NormalizedValue::Text(v.format("%H:%M:%S%.f").to_string()),
        SqlValue::DateTime(v) => {
            NormalizedValue::Text(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
    }
}

fn normalize_float(v: f64) -> NormalizedValue {
    if v.is_nan() {
        return NormalizedValue::Null;
    }
    match Decimal::try_from(v) {
        Ok(d) => normalize_decimal(d),
        // Infinite or outside the decimal range.
        Err(_) => NormalizedValue::Text(v.to_string()),
    }
}

fn normalize_decimal(d: Decimal) -> NormalizedValue {
    let d = d.normalize();
    if d.scale() == 0 {
        NormalizedValue::Integer(d.mantissa())
    } else {
        NormalizedValue::Decimal(d)
    }
}

/// Compare two cell values under the normalization rules.
///
/// Returns `true` when both are null-equivalent or their normalized forms
/// are equal.
pub fn values_equal(a: &SqlValue, b: &SqlValue) -> bool {
    normalize_value(a) == normalize_value(b)
}

/// Normalize a column default as reported by the catalog.
///
/// An absent default and the literal text `NULL` (any case, surrounding
/// whitespace ignored) both mean "no default" and map to `None`. Every other
/// default is kept verbatim.
pub fn normalize_default(default: Option<&str>) -> Option<&str> {
    match default {
        None => None,
        Some(s) if s.trim().eq_ignore_ascii_case("null") => None,
        Some(s) => Some(s),
    }
}

/// Render a normalized default for reports (`NULL` when there is none).
pub fn display_default(default: Option<&str>) -> String {
    normalize_default(default).unwrap_or("NULL").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    #[test]
    fn test_null_and_nan_are_null_equivalent() {
        assert!(normalize_value(&SqlValue::Null).is_null());
        assert!(normalize_value(&SqlValue::Float(f64::NAN)).is_null());
        assert!(values_equal(&SqlValue::Null, &SqlValue::Float(f64::NAN)));
        assert!(values_equal(&SqlValue::Float(f64::NAN), &SqlValue::Float(f64::NAN)));
        assert!(!values_equal(&SqlValue::Null, &SqlValue::Int(0)));
        assert!(!values_equal(&SqlValue::Null, &SqlValue::Text(String::new())));
    }

    #[test]
    fn test_integer_widths_unify() {
        assert!(values_equal(&SqlValue::Int(42), &SqlValue::UInt(42)));
        assert!(values_equal(&SqlValue::Bool(true), &SqlValue::Int(1)));
        assert!(values_equal(&SqlValue::Bool(false), &SqlValue::UInt(0)));
        assert!(!values_equal(&SqlValue::Int(-1), &SqlValue::UInt(u64::MAX)));
    }

    #[test]
    fn test_decimal_and_float_unify() {
        let two = Decimal::from_str("2.00").unwrap();
        assert!(values_equal(&SqlValue::Decimal(two), &SqlValue::Int(2)));
        assert!(values_equal(&SqlValue::Float(2.0), &SqlValue::Int(2)));

        let one_five = Decimal::from_str("1.50").unwrap();
        assert!(values_equal(&SqlValue::Decimal(one_five), &SqlValue::Float(1.5)));
        assert!(!values_equal(
            &SqlValue::Decimal(one_five),
            &SqlValue::Decimal(Decimal::from_str("1.51").unwrap())
        ));
    }

    #[test]
    fn test_infinite_float_keeps_text() {
        assert_eq!(
            normalize_value(&SqlValue::Float(f64::INFINITY)),
            NormalizedValue::Text("inf".to_string())
        );
    }

    #[test]
    fn test_text_is_verbatim() {
        assert!(!values_equal(&SqlValue::from("1"), &SqlValue::Int(1)));
        assert!(!values_equal(&SqlValue::from("abc "), &SqlValue::from("abc")));
        assert!(!values_equal(&SqlValue::from("ABC"), &SqlValue::from("abc")));
        assert!(values_equal(&SqlValue::from("paid"), &SqlValue::from("paid")));
    }

    #[test]
    fn test_temporal_and_uuid_render_canonically() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            normalize_value(&SqlValue::Date(d)),
            NormalizedValue::Text("2024-01-31".to_string())
        );
        let ts = d.and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(
            normalize_value(&SqlValue::DateTime(ts)),
            NormalizedValue::Text("2024-01-31T08:30:00".to_string())
        );

        let id = Uuid::nil();
        assert!(values_equal(
            &SqlValue::Uuid(id),
            &SqlValue::from("00000000-0000-0000-0000-000000000000")
        ));
    }

    #[test]
    fn test_normalize_default() {
        assert_eq!(normalize_default(None), None);
        assert_eq!(normalize_default(Some("NULL")), None);
        assert_eq!(normalize_default(Some("null")), None);
        assert_eq!(normalize_default(Some(" NULL ")), None);
        assert_eq!(normalize_default(Some("0")), Some("0"));
        assert_eq!(normalize_default(Some("")), Some(""));
        assert_eq!(
            normalize_default(Some("CURRENT_TIMESTAMP")),
            Some("CURRENT_TIMESTAMP")
        );
    }

    #[test]
    fn test_display_default() {
        assert_eq!(display_default(None), "NULL");
        assert_eq!(display_default(Some("null")), "NULL");
        assert_eq!(display_default(Some("pending")), "pending");
    }

    #[test]
    fn test_ordering_is_total_across_types() {
        let mut values = vec![
            NormalizedValue::Text("b".to_string()),
            NormalizedValue::Integer(10),
            NormalizedValue::Null,
            NormalizedValue::Integer(2),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                NormalizedValue::Null,
                NormalizedValue::Integer(2),
                NormalizedValue::Integer(10),
                NormalizedValue::Text("b".to_string()),
            ]
        );
    }
}

//! Lenient numeric coercion for loosely-typed inputs
//!
//! Scraped provider data and job requests arrive as JSON or TOML written by
//! other tools. Numbers may be strings, nulls, negative or non-finite. These
//! helpers never fail; callers decide whether a `None` is a default or an error.

use serde_json::Value;

/// Read a finite number from a JSON value (numbers or numeric strings)
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    n.filter(|v| v.is_finite())
}

/// Read an optional field as a finite number
pub fn opt_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(number)
}

/// Non-negative number, or `default` when absent, unparseable or negative
pub fn non_negative_or(value: Option<&Value>, default: f64) -> f64 {
    opt_number(value).filter(|v| *v >= 0.0).unwrap_or(default)
}

/// Strictly positive number, or `default` otherwise
pub fn positive_or(value: Option<&Value>, default: f64) -> f64 {
    opt_number(value).filter(|v| *v > 0.0).unwrap_or(default)
}

/// Integer clamped to at least `min`; fractional inputs are truncated
pub fn count_at_least(value: Option<&Value>, default: u64, min: u64) -> u64 {
    match opt_number(value) {
        Some(v) if v >= min as f64 => (v.trunc() as u64).max(min),
        Some(_) => min,
        None => default.max(min),
    }
}

/// Trimmed, non-empty string
pub fn text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_forms() {
        assert_eq!(number(&json!(1.5)), Some(1.5));
        assert_eq!(number(&json!(" 2.25 ")), Some(2.25));
        assert_eq!(number(&json!("n/a")), None);
        assert_eq!(number(&json!(null)), None);
        assert_eq!(number(&json!(true)), None);
        assert_eq!(number(&json!("inf")), None);
    }

    #[test]
    fn test_non_negative_or() {
        assert_eq!(non_negative_or(Some(&json!(-3)), 30.0), 30.0);
        assert_eq!(non_negative_or(Some(&json!(0)), 30.0), 0.0);
        assert_eq!(non_negative_or(None, 30.0), 30.0);
    }

    #[test]
    fn test_positive_or() {
        assert_eq!(positive_or(Some(&json!(0)), 10.0), 10.0);
        assert_eq!(positive_or(Some(&json!("25")), 10.0), 25.0);
    }

    #[test]
    fn test_count_at_least() {
        assert_eq!(count_at_least(Some(&json!(-4)), 8, 1), 1);
        assert_eq!(count_at_least(Some(&json!(0)), 8, 1), 1);
        assert_eq!(count_at_least(Some(&json!(12.9)), 8, 1), 12);
        assert_eq!(count_at_least(Some(&json!("abc")), 8, 1), 8);
        assert_eq!(count_at_least(None, 0, 0), 0);
    }

    #[test]
    fn test_text() {
        assert_eq!(text(Some("  aws ")), Some("aws".to_string()));
        assert_eq!(text(Some("   ")), None);
        assert_eq!(text(None), None);
    }
}

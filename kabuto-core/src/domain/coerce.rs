//! Numeric coercion for scraped values.
//!
//! Crawled pages deliver numbers as display strings: thousands separators,
//! unit glyphs (円 yen, 株 shares, 倍 times) and the placeholders `-` / `---`
//! for "no value". Every numeric record field goes through these functions.

use crate::error::EntityError;

/// Normalize a display string into a parseable numeric string.
///
/// `"-"` maps to `"0"`, `"---"` is replaced by `"0"`, glyphs and `,` are stripped.
pub fn normalize_numeric(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed == "-" {
        return "0".to_string();
    }
    trimmed
        .replace("---", "0")
        .replace(['円', '株', '倍', ','], "")
}

/// Coerce a display string to `f64`.
pub fn coerce_f64(input: &str) -> Result<f64, EntityError> {
    match normalize_numeric(input).parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(EntityError::NotNumeric {
            value: input.to_string(),
            target: "float",
        }),
    }
}

/// Coerce a display string to `i64`. Integral floats such as `"100.0"` are accepted.
pub fn coerce_i64(input: &str) -> Result<i64, EntityError> {
    let normalized = normalize_numeric(input);
    if let Ok(v) = normalized.parse::<i64>() {
        return Ok(v);
    }
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(EntityError::NotNumeric {
            value: input.to_string(),
            target: "integer",
        }),
    }
}

/// Normalize a stock code: `"1375.0"` and `"1375"` are the same code.
pub fn normalize_code(input: &str) -> String {
    input.trim().split('.').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_dash_is_zero() {
        assert_eq!(normalize_numeric("-"), "0");
        assert_eq!(coerce_f64("-").unwrap(), 0.0);
        assert_eq!(coerce_f64("---").unwrap(), 0.0);
    }

    #[test]
    fn strips_separators_and_glyphs() {
        assert_eq!(coerce_f64("1,234円").unwrap(), 1234.0);
        assert_eq!(coerce_f64("100株").unwrap(), 100.0);
        assert_eq!(coerce_f64("12.5倍").unwrap(), 12.5);
    }

    #[test]
    fn negative_numbers_survive() {
        assert_eq!(coerce_f64("-12.5").unwrap(), -12.5);
    }

    #[test]
    fn non_numeric_residue_is_an_error() {
        let err = coerce_f64("abc").unwrap_err();
        assert!(matches!(err, EntityError::NotNumeric { target: "float", .. }));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for text in ["NaN", "nan", "inf", "-inf", "infinity", "1e400"] {
            assert!(
                matches!(coerce_f64(text), Err(EntityError::NotNumeric { target: "float", .. })),
                "{text} coerced"
            );
        }
    }

    #[test]
    fn integer_accepts_integral_floats() {
        assert_eq!(coerce_i64("100.0").unwrap(), 100);
        assert_eq!(coerce_i64("1,000").unwrap(), 1000);
        assert!(coerce_i64("1.5").is_err());
    }

    #[test]
    fn code_drops_decimal_suffix() {
        assert_eq!(normalize_code("1375.0"), "1375");
        assert_eq!(normalize_code("7203"), "7203");
    }
}

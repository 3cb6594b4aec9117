// Decimal helpers shared by the engine and any front end that edits cells.
// User input uses either a comma or a dot as the decimal separator; export
// files use the comma (regional convention).

pub mod decimal {
    use std::str::FromStr;

    /// Normalizes typed input the way cells are stored: the first comma becomes a dot.
    pub fn clean_input(raw: &str) -> String {
        raw.replacen(',', ".", 1)
    }

    /// Parses a user-typed decimal. Empty or unparseable input is `None`, never zero.
    /// Thousands separators are not accepted.
    pub fn parse_user_number(raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        f64::from_str(&clean_input(trimmed)).ok()
    }

    /// True only for finite values.
    pub fn is_usable(value: Option<f64>) -> bool {
        matches!(value, Some(v) if v.is_finite())
    }

    /// Parses and keeps the value only when it is finite.
    pub fn usable_number(raw: &str) -> Option<f64> {
        parse_user_number(raw).filter(|v| v.is_finite())
    }

    /// Division that is undefined unless both operands are finite and the
    /// denominator is strictly positive.
    pub fn safe_divide(numerator: f64, denominator: f64) -> Option<f64> {
        if numerator.is_finite() && denominator.is_finite() && denominator > 0.0 {
            Some(numerator / denominator)
        } else {
            None
        }
    }

    /// Renders a number for export with a comma decimal separator.
    pub fn format_decimal(value: f64) -> String {
        value.to_string().replace('.', ",")
    }

    /// Converts a stored (dot-normalized) cell to its exported form.
    pub fn export_cell(raw: &str) -> String {
        raw.replace('.', ",")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_comma_decimal() {
            assert_eq!(parse_user_number("1234,5"), Some(1234.5));
            assert_eq!(parse_user_number("1234.5"), Some(1234.5));
            assert_eq!(parse_user_number(" 42 "), Some(42.0));
        }

        #[test]
        fn test_parse_empty_is_not_zero() {
            assert_eq!(parse_user_number(""), None);
            assert_eq!(parse_user_number("   "), None);
        }

        #[test]
        fn test_parse_rejects_garbage_and_thousands() {
            assert_eq!(parse_user_number("abc"), None);
            assert_eq!(parse_user_number("1,234,5"), None);
            assert_eq!(parse_user_number("1 234"), None);
        }

        #[test]
        fn test_usable_excludes_non_finite() {
            assert!(is_usable(Some(0.0)));
            assert!(!is_usable(Some(f64::NAN)));
            assert!(!is_usable(Some(f64::INFINITY)));
            assert!(!is_usable(None));
            assert_eq!(usable_number("inf"), None);
        }

        #[test]
        fn test_safe_divide_boundaries() {
            assert_eq!(safe_divide(100.0, 0.0), None);
            assert_eq!(safe_divide(100.0, -5.0), None);
            assert_eq!(safe_divide(0.0, 5.0), Some(0.0));
            assert_eq!(safe_divide(100.0, 5.0), Some(20.0));
            assert_eq!(safe_divide(f64::NAN, 5.0), None);
            assert_eq!(safe_divide(1.0, f64::INFINITY), None);
        }

        #[test]
        fn test_format_decimal_uses_comma() {
            assert_eq!(format_decimal(0.000123), "0,000123");
            assert_eq!(format_decimal(1500.0), "1500");
            assert_eq!(export_cell("12.5"), "12,5");
            assert_eq!(export_cell(""), "");
        }
    }
}

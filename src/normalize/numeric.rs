//! Numeric cell coercion.
//!
//! Price exports decorate numbers with currency symbols, thousands separators,
//! percent signs and (for volume) `K`/`M`/`B` suffixes. We strip the decoration and
//! parse what remains; anything still non-numeric becomes missing, never zero.

/// Outcome of coercing one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Value(f64),
    /// Blank or an explicit null token. Not an error.
    Missing,
    /// Non-numeric residue remained after stripping. Reported as a parse error.
    Invalid,
}

impl Coerced {
    pub fn value(self) -> Option<f64> {
        match self {
            Coerced::Value(v) => Some(v),
            Coerced::Missing | Coerced::Invalid => None,
        }
    }
}

const NULL_TOKENS: [&str; 9] = ["", "-", "--", "\u{2014}", "n/a", "na", "nan", "null", "none"];

const CURRENCY_SYMBOLS: [char; 6] = ['$', '\u{20ac}', '\u{a3}', '\u{a5}', '\u{20b9}', '\u{a2}'];

/// True for blank cells and the usual "no value" placeholders (`-`, `n/a`, `.`...).
pub fn is_null_token(raw: &str) -> bool {
    let s = raw.trim().trim_matches('"').trim();
    s == "." || NULL_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t))
}

/// Coerce a cell to `f64`.
///
/// With `allow_suffix`, a trailing `K`/`M`/`B` multiplies by 1e3/1e6/1e9.
pub fn coerce_number(raw: &str, allow_suffix: bool) -> Coerced {
    if is_null_token(raw) {
        return Coerced::Missing;
    }

    let mut s = raw.trim().trim_matches('"').trim();

    // Accounting negatives: `(1,234.50)` means -1234.50.
    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }

    let mut cleaned: String = s
        .chars()
        .filter(|c| !(c.is_whitespace() || *c == ',' || *c == '%' || *c == '\'' || CURRENCY_SYMBOLS.contains(c)))
        .collect();

    if let Some(rest) = cleaned.strip_prefix('+') {
        cleaned = rest.to_string();
    }

    let mut exponent = 0;
    if allow_suffix {
        if let Some(last) = cleaned.chars().last() {
            exponent = match last.to_ascii_uppercase() {
                'K' => 3,
                'M' => 6,
                'B' => 9,
                _ => 0,
            };
            if exponent > 0 {
                cleaned.pop();
            }
        }
    }

    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'e' | b'E')) {
        return Coerced::Invalid;
    }

    // Scale in decimal notation rather than multiplying floats, so "1.2M" is
    // exactly the double nearest 1_200_000.
    let parsed = if exponent > 0 {
        if cleaned.contains(['e', 'E']) {
            return Coerced::Invalid;
        }
        format!("{cleaned}e{exponent}").parse::<f64>()
    } else {
        cleaned.parse::<f64>()
    };

    match parsed {
        Ok(v) if v.is_finite() => Coerced::Value(if negative { -v } else { v }),
        _ => Coerced::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_suffixes_expand() {
        assert_eq!(coerce_number("1.2M", true), Coerced::Value(1_200_000.0));
        assert_eq!(coerce_number("500K", true), Coerced::Value(500_000.0));
        assert_eq!(coerce_number("2.5B", true), Coerced::Value(2_500_000_000.0));
        assert_eq!(coerce_number("2.5b", true), Coerced::Value(2_500_000_000.0));
        assert_eq!(coerce_number("1,234", true), Coerced::Value(1234.0));
    }

    #[test]
    fn suffix_is_rejected_outside_volume_columns() {
        assert_eq!(coerce_number("1.2M", false), Coerced::Invalid);
    }

    #[test]
    fn strips_currency_separators_and_percent() {
        assert_eq!(coerce_number("$1,234.50", false), Coerced::Value(1234.5));
        assert_eq!(coerce_number("\u{a3}10", false), Coerced::Value(10.0));
        assert_eq!(coerce_number("-1.25%", false), Coerced::Value(-1.25));
        assert_eq!(coerce_number("+0.5", false), Coerced::Value(0.5));
        assert_eq!(coerce_number("(12.5)", false), Coerced::Value(-12.5));
        assert_eq!(coerce_number(" \"150.25\" ", false), Coerced::Value(150.25));
    }

    #[test]
    fn null_tokens_are_missing_not_errors() {
        for raw in ["", "  ", "-", "N/A", "nan", "NULL", ".", "\u{2014}"] {
            assert_eq!(coerce_number(raw, true), Coerced::Missing, "{raw:?}");
        }
    }

    #[test]
    fn residue_is_invalid_never_zero() {
        for raw in ["abc", "12abc", "1.2.3", "$", "inf", "1e3M", "12 34x"] {
            assert_eq!(coerce_number(raw, true), Coerced::Invalid, "{raw:?}");
        }
    }
}

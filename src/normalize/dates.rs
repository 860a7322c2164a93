//! Date parsing for regional formats.
//!
//! We recommend ISO dates (`YYYY-MM-DD`), but price histories and indicator
//! downloads arrive as `01/15/2024`, `15.01.2024`, `Jan 15, 2024`, `2024-01` and
//! date-times. Everything is reduced to a calendar date; the time of day is dropped.

use chrono::{Datelike, NaiveDate};

use crate::domain::DateOrder;

/// Textual month layouts, tried after the numeric forms.
const TEXT_FORMATS: [&str; 10] = [
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%Y-%b-%d",
    "%b-%d-%Y",
];

/// Parse a date cell. Returns `None` when no known layout matches.
pub fn parse_date(raw: &str, order: DateOrder) -> Option<NaiveDate> {
    let s = raw.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }

    if let Some(d) = parse_date_only(s, order) {
        return Some(d);
    }

    // Date-times: cut before the token holding the first `:` (`2024-01-15T16:00:00Z`,
    // `01/15/2024 16:00`, `Jan 15, 2024 4:00 PM`).
    let colon = s.find(':')?;
    let cut = s[..colon].rfind([' ', 'T'])?;
    let head = s[..cut].trim_end().trim_end_matches(',');
    if head.is_empty() {
        return None;
    }
    parse_date_only(head, order)
}

fn parse_date_only(s: &str, order: DateOrder) -> Option<NaiveDate> {
    if let Some(d) = parse_numeric(s, order) {
        return Some(d);
    }
    TEXT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Numeric layouts: `YYYYMMDD`, `Y-M-D`, `M/D/Y` or `D/M/Y`, `Y-M`, `M/Y`.
fn parse_numeric(s: &str, order: DateOrder) -> Option<NaiveDate> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return ymd(num(&s[0..4])?, num(&s[4..6])?, num(&s[6..8])?);
    }

    let sep = s.chars().find(|c| matches!(c, '/' | '-' | '.'))?;
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    match parts.as_slice() {
        [y, m, d] if y.len() == 4 => ymd(num(y)?, num(m)?, num(d)?),
        [a, b, y] if y.len() == 4 || y.len() == 2 => {
            let year = expand_year(y)?;
            let (a, b) = (num(a)?, num(b)?);
            // Prefer the configured order, fall back to the other one when the first
            // reading is impossible (e.g. `25/01/2024` under month-first).
            let (first, second) = match order {
                DateOrder::Mdy => ((a, b), (b, a)),
                DateOrder::Dmy => ((b, a), (a, b)),
            };
            ymd(year, first.0, first.1).or_else(|| ymd(year, second.0, second.1))
        }
        [y, m] if y.len() == 4 => ymd(num(y)?, num(m)?, 1),
        [m, y] if y.len() == 4 && m.len() <= 2 => ymd(num(y)?, num(m)?, 1),
        _ => None,
    }
}

fn num(s: &str) -> Option<u32> {
    s.parse().ok()
}

/// Two-digit years pivot like POSIX `%y`: 69-99 → 1900s, 00-68 → 2000s.
fn expand_year(y: &str) -> Option<u32> {
    let v = num(y)?;
    Some(match y.len() {
        2 if v >= 69 => 1900 + v,
        2 => 2000 + v,
        _ => v,
    })
}

fn ymd(year: u32, month: u32, day: u32) -> Option<NaiveDate> {
    let d = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    // Guard against absurd years from mis-ordered fields.
    (1000..=9999).contains(&d.year()).then_some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn iso_and_compact_forms() {
        assert_eq!(parse_date("2024-01-15", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024/01/15", DateOrder::Dmy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("20240115", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024-01", DateOrder::Mdy), Some(d(2024, 1, 1)));
    }

    #[test]
    fn regional_order_with_fallback() {
        assert_eq!(parse_date("01/15/2024", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("03/04/2024", DateOrder::Mdy), Some(d(2024, 3, 4)));
        assert_eq!(parse_date("03/04/2024", DateOrder::Dmy), Some(d(2024, 4, 3)));
        // Impossible as month-first, so read day-first.
        assert_eq!(parse_date("25/01/2024", DateOrder::Mdy), Some(d(2024, 1, 25)));
        assert_eq!(parse_date("15.01.2024", DateOrder::Dmy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("01-15-24", DateOrder::Mdy), Some(d(2024, 1, 15)));
    }

    #[test]
    fn textual_months() {
        assert_eq!(parse_date("Jan 15, 2024", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("15 Jan 2024", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("15-Jan-2024", DateOrder::Mdy), Some(d(2024, 1, 15)));
    }

    #[test]
    fn date_times_keep_the_date() {
        assert_eq!(parse_date("2024-01-15T16:00:00Z", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("01/15/2024 16:00", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("Jan 15, 2024 16:00", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("15 Jan 2024, 4:00 PM", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15 09:30:00", DateOrder::Mdy), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("16:00", DateOrder::Mdy), None);
    }

    #[test]
    fn garbage_is_rejected() {
        for raw in ["", "not a date", "13/13/2024", "2024-02-30", "1/2", "15"] {
            assert_eq!(parse_date(raw, DateOrder::Mdy), None, "{raw:?}");
        }
    }
}

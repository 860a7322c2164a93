//! Versioned header synonym table.
//!
//! Raw uploads name the same field many ways (`Price`, `Last`, `Vol.`...). Every
//! recognized alias is listed here explicitly; bump `SYNONYMS_VERSION` whenever an
//! entry changes so exports can be traced back to the mapping that produced them.

use serde::Serialize;

pub const SYNONYMS_VERSION: u32 = 1;

/// Canonical fields the normalizer knows how to type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
    ChangePct,
}

impl Field {
    /// Output schema for securities uploads, in order (after `date`).
    pub const SECURITIES_VALUES: [Field; 5] = [Field::Open, Field::High, Field::Low, Field::Close, Field::Volume];

    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Open => "open",
            Field::High => "high",
            Field::Low => "low",
            Field::Close => "close",
            Field::Volume => "volume",
            Field::ChangePct => "change_pct",
        }
    }

    /// Volume cells accept `K`/`M`/`B` suffix notation.
    pub fn accepts_suffix(self) -> bool {
        self == Field::Volume
    }
}

pub struct SynonymTable {
    entries: &'static [(Field, &'static [&'static str])],
}

pub const SYNONYMS: SynonymTable = SynonymTable {
    entries: &[
        (Field::Date, &["date", "observation_date", "timestamp", "time"]),
        (Field::Open, &["open"]),
        (Field::High, &["high"]),
        (Field::Low, &["low"]),
        (Field::Close, &["close", "price", "last", "adj close"]),
        (Field::Volume, &["volume", "vol.", "vol"]),
        (Field::ChangePct, &["change %", "change_pct", "chg %", "change (%)"]),
    ],
};

impl SynonymTable {
    /// Resolve a raw header to a canonical field, if it is a known alias.
    pub fn lookup(&self, header: &str) -> Option<Field> {
        let key = match_key(header);
        self.entries
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| match_key(a) == key))
            .map(|(field, _)| *field)
    }
}

/// Trim, strip a UTF-8 BOM, and lowercase a header for display/pass-through.
pub fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, `Date` is not recognized.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

/// Case-, whitespace- and underscore-insensitive comparison key.
fn match_key(name: &str) -> String {
    normalize_header_name(name)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_and_spacing_insensitive() {
        assert_eq!(SYNONYMS.lookup("Date"), Some(Field::Date));
        assert_eq!(SYNONYMS.lookup("\u{feff}Date"), Some(Field::Date));
        assert_eq!(SYNONYMS.lookup("PRICE"), Some(Field::Close));
        assert_eq!(SYNONYMS.lookup(" Vol. "), Some(Field::Volume));
        assert_eq!(SYNONYMS.lookup("Change %"), Some(Field::ChangePct));
        assert_eq!(SYNONYMS.lookup("change%"), Some(Field::ChangePct));
        assert_eq!(SYNONYMS.lookup("Adj Close"), Some(Field::Close));
        assert_eq!(SYNONYMS.lookup("Observation Date"), Some(Field::Date));
        assert_eq!(SYNONYMS.lookup("GDP"), None);
    }

    #[test]
    fn aliases_are_unique_across_fields() {
        let mut seen = std::collections::HashSet::new();
        for (_, aliases) in SYNONYMS.entries {
            for a in *aliases {
                assert!(seen.insert(match_key(a)), "duplicate alias {a}");
            }
        }
    }
}

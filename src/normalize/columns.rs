//! Column mapping: raw headers → canonical output columns.
//!
//! The plan is computed from headers alone, before any cell is read, so schema
//! errors surface immediately and the output column order is fixed up front.

use std::collections::HashSet;

use crate::domain::{DataType, Field, SYNONYMS, normalize_header_name};
use crate::error::NormalizeError;

/// How the cells of an output column are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Known numeric field; `suffix` enables `K`/`M`/`B` volume notation.
    Numeric { suffix: bool },
    /// Unrecognized indicator column: numeric if most cells coerce, else text.
    Detect,
}

/// One output value column and where its cells come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueColumn {
    pub name: String,
    /// Source index in the raw row; `None` for an absent securities column.
    pub source: Option<usize>,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    pub date_index: usize,
    pub values: Vec<ValueColumn>,
    /// Raw headers that do not make it into the output (with the reason).
    pub ignored: Vec<String>,
    /// Canonical columns the upload did not supply (emitted as all-missing).
    pub absent: Vec<String>,
}

/// Map headers for the declared data type.
pub fn plan_columns(headers: &[String], data_type: DataType) -> Result<ColumnPlan, NormalizeError> {
    // First occurrence of each canonical field wins.
    let mut fields: Vec<(Field, usize)> = Vec::new();
    let mut passthrough: Vec<(String, usize)> = Vec::new();
    let mut ignored = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for (idx, raw) in headers.iter().enumerate() {
        let header = normalize_header_name(raw);
        match SYNONYMS.lookup(&header) {
            Some(field) => {
                if let Some((_, first)) = fields.iter().find(|(f, _)| *f == field) {
                    ignored.push(format!(
                        "{header} (duplicate of `{}`, using '{}')",
                        field.name(),
                        normalize_header_name(&headers[*first])
                    ));
                } else {
                    fields.push((field, idx));
                    seen_names.insert(field.name().to_string());
                }
            }
            None => {
                let name = if header.is_empty() {
                    format!("unnamed_{}", idx + 1)
                } else {
                    header
                };
                passthrough.push((name, idx));
            }
        }
    }

    for required in data_type.required_fields() {
        if !fields.iter().any(|(f, _)| f == required) {
            return Err(NormalizeError::Schema {
                column: required.name().to_string(),
                data_type: data_type.display_name().to_string(),
            });
        }
    }

    let index_of = |field: Field| fields.iter().find(|(f, _)| *f == field).map(|(_, i)| *i);
    let date_index = index_of(Field::Date).ok_or_else(|| NormalizeError::Schema {
        column: Field::Date.name().to_string(),
        data_type: data_type.display_name().to_string(),
    })?;

    let mut values = Vec::new();
    let mut absent = Vec::new();

    match data_type {
        DataType::Securities => {
            for field in Field::SECURITIES_VALUES {
                let source = index_of(field);
                if source.is_none() {
                    absent.push(field.name().to_string());
                }
                values.push(ValueColumn {
                    name: field.name().to_string(),
                    source,
                    kind: ValueKind::Numeric {
                        suffix: field.accepts_suffix(),
                    },
                });
            }
            for (field, idx) in &fields {
                if *field != Field::Date && !Field::SECURITIES_VALUES.contains(field) {
                    ignored.push(format!("{} (not part of the securities schema)", normalize_header_name(&headers[*idx])));
                }
            }
            for (name, _) in &passthrough {
                ignored.push(format!("{name} (unrecognized column)"));
            }
        }
        DataType::Indicator => {
            // Source order is preserved; recognized fields get their canonical name.
            let mut ordered: Vec<(usize, ValueColumn)> = fields
                .iter()
                .filter(|(f, _)| *f != Field::Date)
                .map(|(f, idx)| {
                    (
                        *idx,
                        ValueColumn {
                            name: f.name().to_string(),
                            source: Some(*idx),
                            kind: ValueKind::Numeric {
                                suffix: f.accepts_suffix(),
                            },
                        },
                    )
                })
                .collect();
            for (name, idx) in passthrough {
                if !seen_names.insert(name.clone()) {
                    ignored.push(format!("{name} (duplicate column name)"));
                    continue;
                }
                ordered.push((
                    idx,
                    ValueColumn {
                        name,
                        source: Some(idx),
                        kind: ValueKind::Detect,
                    },
                ));
            }
            ordered.sort_by_key(|(idx, _)| *idx);
            values = ordered.into_iter().map(|(_, c)| c).collect();
        }
    }

    Ok(ColumnPlan {
        date_index,
        values,
        ignored,
        absent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(h: &[&str]) -> Vec<String> {
        h.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn securities_schema_is_fixed_and_reports_absent_columns() {
        let plan = plan_columns(&headers(&["Date", "Price", "Vol."]), DataType::Securities).unwrap();
        let names: Vec<_> = plan.values.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["open", "high", "low", "close", "volume"]);
        assert_eq!(plan.date_index, 0);
        assert_eq!(plan.values[3].source, Some(1));
        assert_eq!(plan.values[4].source, Some(2));
        assert_eq!(plan.values[4].kind, ValueKind::Numeric { suffix: true });
        assert_eq!(plan.absent, vec!["open", "high", "low"]);
        assert!(plan.ignored.is_empty());
    }

    #[test]
    fn securities_requires_close() {
        let err = plan_columns(&headers(&["Date", "Open", "Volume"]), DataType::Securities).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Schema {
                column: "close".to_string(),
                data_type: "securities".to_string()
            }
        );
    }

    #[test]
    fn securities_lists_extra_and_duplicate_columns_as_ignored() {
        let plan = plan_columns(
            &headers(&["Date", "Price", "Close", "Change %", "Ticker"]),
            DataType::Securities,
        )
        .unwrap();
        assert_eq!(plan.values[3].source, Some(1));
        assert_eq!(plan.ignored.len(), 3);
        assert!(plan.ignored[0].starts_with("Close (duplicate of `close`"));
    }

    #[test]
    fn indicator_passes_unknown_columns_through_in_source_order() {
        let plan = plan_columns(
            &headers(&["GDPC1", "observation_date", "Close", "UNRATE"]),
            DataType::Indicator,
        )
        .unwrap();
        assert_eq!(plan.date_index, 1);
        let names: Vec<_> = plan.values.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["GDPC1", "close", "UNRATE"]);
        assert_eq!(plan.values[0].kind, ValueKind::Detect);
        assert!(plan.absent.is_empty());
    }

    #[test]
    fn indicator_requires_date() {
        let err = plan_columns(&headers(&["GDPC1"]), DataType::Indicator).unwrap_err();
        assert!(matches!(err, NormalizeError::Schema { ref column, .. } if column == "date"));
    }
}

//! Normalization of raw board tables into typed tables.
//!
//! Board exports are stringly typed. This module classifies every column
//! once by its name, coerces numeric and date columns, fills missing text,
//! and drops rows and columns that carry no data at all.

pub mod dates;

use crate::models::{Column, ColumnValues, Table};
use tracing::debug;

pub use dates::parse_date;

/// Column category derived from the column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Date,
    Text,
}

/// Ordered keyword configuration driving [`KeywordRules::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRules {
    /// Case-sensitive substrings marking numeric columns.
    pub numeric: Vec<String>,
    /// Case-sensitive substrings marking date columns.
    pub date: Vec<String>,
    /// Placeholder written into missing text cells.
    pub missing_text: String,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            numeric: default_numeric_keywords(),
            date: default_date_keywords(),
            missing_text: default_missing_text(),
        }
    }
}

impl From<&crate::config::NormalizeConfig> for KeywordRules {
    fn from(config: &crate::config::NormalizeConfig) -> Self {
        Self {
            numeric: config.numeric_keywords.clone(),
            date: config.date_keywords.clone(),
            missing_text: config.missing_text.clone(),
        }
    }
}

pub fn default_numeric_keywords() -> Vec<String> {
    ["Amount", "Value", "Rupees", "Quantity", "Billed", "Collected"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_date_keywords() -> Vec<String> {
    ["Date", "Month", "Close", "Start", "End"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_missing_text() -> String {
    "Not Provided".to_string()
}

impl KeywordRules {
    /// Classify a column by name.
    ///
    /// Date keywords take precedence over numeric keywords, so a column named
    /// "Billed Date" is a date column.
    pub fn classify(&self, column_name: &str) -> ColumnKind {
        if contains_any(column_name, &self.date) {
            ColumnKind::Date
        } else if contains_any(column_name, &self.numeric) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        }
    }
}

fn contains_any(column_name: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| column_name.contains(k.as_str()))
}

/// Normalize a table.
///
/// An empty table is returned unchanged. Otherwise fully-null rows and then
/// fully-null columns are dropped, every column is coerced according to its
/// [`ColumnKind`], and a final sweep removes anything coercion left entirely
/// null (a date column in which nothing parsed). Columns that are already
/// typed keep their values, so normalizing twice is the same as once.
pub fn normalize(table: &Table, rules: &KeywordRules) -> Table {
    if table.is_empty() {
        return table.clone();
    }

    let trimmed = drop_empty(table);
    let mut normalized = Table::new();

    for column in trimmed.columns() {
        let kind = rules.classify(&column.name);
        let values = coerce(&column.values, kind, &rules.missing_text);
        debug!(
            "Column '{}' classified as {:?} ({} -> {})",
            column.name,
            kind,
            column.values.type_name(),
            values.type_name()
        );
        normalized.push_column(Column::new(column.name.clone(), values));
    }

    drop_empty(&normalized)
}

/// Drop rows where every cell is null, then columns where every cell is null.
fn drop_empty(table: &Table) -> Table {
    let keep_rows: Vec<usize> = (0..table.num_rows())
        .filter(|&row| table.columns().iter().any(|c| !c.values.is_null(row)))
        .collect();

    let rows = if keep_rows.len() == table.num_rows() {
        table.clone()
    } else {
        debug!("Dropping {} empty rows", table.num_rows() - keep_rows.len());
        table.select_rows(&keep_rows)
    };

    let mut result = Table::new();
    for column in rows.columns() {
        if column.values.all_null() {
            debug!("Dropping empty column '{}'", column.name);
            continue;
        }
        result.push_column(column.clone());
    }
    result
}

fn coerce(values: &ColumnValues, kind: ColumnKind, missing_text: &str) -> ColumnValues {
    match (values, kind) {
        (ColumnValues::Text(cells), ColumnKind::Numeric) => {
            ColumnValues::Number(cells.iter().map(|c| parse_amount(c.as_deref())).collect())
        }
        (ColumnValues::Text(cells), ColumnKind::Date) => ColumnValues::Date(
            cells
                .iter()
                .map(|c| c.as_deref().and_then(parse_date))
                .collect(),
        ),
        (ColumnValues::Text(cells), ColumnKind::Text) => ColumnValues::Text(
            cells
                .iter()
                .map(|c| Some(c.clone().unwrap_or_else(|| missing_text.to_string())))
                .collect(),
        ),
        (typed, _) => typed.clone(),
    }
}

/// Coerce free text into a non-negative amount.
///
/// Every character other than an ASCII digit or `.` is discarded, which also
/// discards currency symbols, thousands separators and minus signs. Anything
/// that still fails to parse is `0.0`.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };

    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn raw_table(columns: &[(&str, Vec<Option<&str>>)]) -> Table {
        columns.iter().fold(Table::new(), |table, (name, cells)| {
            table.with_column(Column::text(*name, cells.clone()))
        })
    }

    #[test]
    fn test_classify() {
        let rules = KeywordRules::default();
        assert_eq!(rules.classify("Masked Deal value"), ColumnKind::Text);
        assert_eq!(rules.classify("Masked Deal Value"), ColumnKind::Numeric);
        assert_eq!(rules.classify("Amount in Rupees"), ColumnKind::Numeric);
        assert_eq!(rules.classify("Tentative Close Date"), ColumnKind::Date);
        assert_eq!(rules.classify("Sector/service"), ColumnKind::Text);
    }

    #[test]
    fn test_date_keyword_wins_tie() {
        let rules = KeywordRules::default();
        assert_eq!(rules.classify("Billed Date"), ColumnKind::Date);
        assert_eq!(rules.classify("Collected Month"), ColumnKind::Date);
        assert_eq!(rules.classify("Billed Value"), ColumnKind::Numeric);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(Some("₹1,20,000.50cr")), 120000.5);
        assert_eq!(parse_amount(Some("N/A")), 0.0);
        assert_eq!(parse_amount(Some("-500")), 500.0);
        assert_eq!(parse_amount(Some("1.2.3")), 0.0);
        assert_eq!(parse_amount(Some("")), 0.0);
        assert_eq!(parse_amount(None), 0.0);
        assert_eq!(parse_amount(Some(&"9".repeat(400))), 0.0);
    }

    #[test]
    fn test_empty_table_unchanged() {
        let table = Table::new();
        assert_eq!(normalize(&table, &KeywordRules::default()), table);
    }

    #[test]
    fn test_normalize_coerces_and_fills() {
        let table = raw_table(&[
            ("item_name", vec![Some("Sakura"), Some("Naruto")]),
            ("Deal Value", vec![Some("₹1,000"), Some("N/A")]),
            ("Close Date", vec![Some("2024-02-01"), Some("soon")]),
            ("Sector", vec![Some("Mining"), None]),
        ]);

        let normalized = normalize(&table, &KeywordRules::default());

        assert_eq!(
            normalized.column("Deal Value").unwrap().values,
            ColumnValues::Number(vec![1000.0, 0.0])
        );
        let close = &normalized.column("Close Date").unwrap().values;
        assert!(matches!(close.get(0), Cell::Date(_)));
        assert!(close.is_null(1));
        assert_eq!(
            normalized.column("Sector").unwrap().values.get(1),
            Cell::Text("Not Provided")
        );
    }

    #[test]
    fn test_drops_empty_rows_and_columns() {
        let table = raw_table(&[
            ("item_name", vec![Some("Sakura"), None, Some("Naruto")]),
            ("Owner", vec![None, None, None]),
            ("Sector", vec![Some("Mining"), None, None]),
        ]);

        let normalized = normalize(&table, &KeywordRules::default());

        assert_eq!(normalized.num_rows(), 2);
        assert!(!normalized.contains("Owner"));
        let names: Vec<_> = normalized.column_names().collect();
        assert_eq!(names, vec!["item_name", "Sector"]);
    }

    #[test]
    fn test_unparseable_date_column_dropped() {
        let table = raw_table(&[
            ("item_name", vec![Some("Sakura")]),
            ("Start", vec![Some("whenever")]),
        ]);

        let normalized = normalize(&table, &KeywordRules::default());
        assert!(!normalized.contains("Start"));
    }

    #[test]
    fn test_no_nulls_outside_date_columns() {
        let table = raw_table(&[
            ("item_name", vec![Some("A"), Some("B"), None]),
            ("Amount", vec![None, Some("12"), Some("x")]),
            ("Status", vec![None, Some("Done"), Some("Open")]),
            ("End", vec![Some("2024-01-01"), None, Some("bad")]),
        ]);

        let normalized = normalize(&table, &KeywordRules::default());
        for column in normalized.columns() {
            if matches!(column.values, ColumnValues::Date(_)) {
                continue;
            }
            assert!(
                (0..normalized.num_rows()).all(|r| !column.values.is_null(r)),
                "column {} has nulls",
                column.name
            );
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let rules = KeywordRules::default();
        let table = raw_table(&[
            ("item_name", vec![Some("Sakura"), None, Some("Naruto"), None]),
            ("Masked Deal Value", vec![Some("1,00,000"), None, Some("abc"), None]),
            ("Billed Date", vec![Some("2024-03-01"), None, Some("later"), None]),
            ("Deal Stage", vec![None, None, Some("Won"), None]),
            ("Notes", vec![None, None, None, None]),
        ]);

        let once = normalize(&table, &rules);
        let twice = normalize(&once, &rules);
        assert_eq!(once, twice);
        assert_eq!(once.num_rows(), 2);
    }

    #[test]
    fn test_normalize_does_not_mutate_input() {
        let table = raw_table(&[("Amount", vec![Some("5")])]);
        let before = table.clone();
        let _ = normalize(&table, &KeywordRules::default());
        assert_eq!(table, before);
    }

    #[test]
    fn test_custom_keywords() {
        let rules = KeywordRules {
            numeric: vec!["Cost".to_string()],
            date: vec![],
            missing_text: "n/a".to_string(),
        };
        let table = raw_table(&[
            ("Unit Cost", vec![Some("$4.50")]),
            ("Close Date", vec![None::<&str>]),
            ("Owner", vec![None]),
            ("item_name", vec![Some("X")]),
        ]);

        let normalized = normalize(&table, &rules);
        assert_eq!(
            normalized.column("Unit Cost").unwrap().values,
            ColumnValues::Number(vec![4.5])
        );
        assert!(!normalized.contains("Close Date"));
        assert!(!normalized.contains("Owner"));
    }
}

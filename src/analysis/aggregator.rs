//! Table aggregation primitives.
//!
//! Grouping, counting and joining over [`Table`]s. Every helper tolerates
//! absent columns: a group-by on a missing column yields an empty mapping,
//! and a sum over a missing column is zero.

use crate::models::{Cell, Column, ColumnValues, Table};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Suffix for deal-side columns whose names collide in a join.
pub const DEAL_SUFFIX: &str = "_deal";

/// Suffix for order-side columns whose names collide in a join.
pub const ORDER_SUFFIX: &str = "_order";

/// Read a column as numbers.
///
/// Numeric columns are returned as-is. Text cells that parse as plain
/// numbers are used, anything else counts as zero.
pub fn numeric_values(column: &Column) -> Vec<f64> {
    match &column.values {
        ColumnValues::Number(values) => values.clone(),
        ColumnValues::Text(cells) => cells
            .iter()
            .map(|c| {
                c.as_deref()
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0)
            })
            .collect(),
        ColumnValues::Date(cells) => vec![0.0; cells.len()],
    }
}

/// Sum a column; zero when the column is absent.
pub fn sum_column(table: &Table, name: &str) -> f64 {
    table
        .column(name)
        .map(|c| numeric_values(c).iter().sum::<f64>())
        .unwrap_or(0.0)
}

/// Sum `value` per distinct `key`. Rows with a null key are skipped.
pub fn group_sum(table: &Table, key: &str, value: &str) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    let Some(key_column) = table.column(key) else {
        return totals;
    };
    let values = table
        .column(value)
        .map(numeric_values)
        .unwrap_or_else(|| vec![0.0; table.num_rows()]);

    for (row, amount) in values.iter().enumerate() {
        if let Some(k) = key_column.values.get(row).key() {
            *totals.entry(k).or_insert(0.0) += amount;
        }
    }

    totals
}

/// Count rows per distinct value of a column. Nulls are not counted.
pub fn value_counts(table: &Table, name: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    let Some(column) = table.column(name) else {
        return counts;
    };

    for row in 0..table.num_rows() {
        if let Some(k) = column.values.get(row).key() {
            *counts.entry(k).or_insert(0) += 1;
        }
    }

    counts
}

/// Cross-tabulate two columns as `outer value -> inner value -> count`.
///
/// The result is dense: every observed outer value maps every observed inner
/// value, with zero for pairs that never occur. Rows where either side is
/// null are ignored.
pub fn crosstab(table: &Table, outer: &str, inner: &str) -> BTreeMap<String, BTreeMap<String, usize>> {
    let (Some(outer_column), Some(inner_column)) = (table.column(outer), table.column(inner)) else {
        return BTreeMap::new();
    };

    let mut pairs: HashMap<(String, String), usize> = HashMap::new();
    let mut outer_keys = BTreeSet::new();
    let mut inner_keys = BTreeSet::new();

    for row in 0..table.num_rows() {
        let (Some(o), Some(i)) = (
            outer_column.values.get(row).key(),
            inner_column.values.get(row).key(),
        ) else {
            continue;
        };
        outer_keys.insert(o.clone());
        inner_keys.insert(i.clone());
        *pairs.entry((o, i)).or_insert(0) += 1;
    }

    outer_keys
        .into_iter()
        .map(|o| {
            let row = inner_keys
                .iter()
                .map(|i| {
                    let count = pairs.get(&(o.clone(), i.clone())).copied().unwrap_or(0);
                    (i.clone(), count)
                })
                .collect();
            (o, row)
        })
        .collect()
}

/// Inner join of `left` and `right` on exact equality of column `on`.
///
/// Rows follow the left table's order; each left row is paired with every
/// matching right row in the right table's order. Rows whose key is null
/// never match. Non-key columns present on both sides are renamed with
/// [`DEAL_SUFFIX`] (left) and [`ORDER_SUFFIX`] (right). When either table
/// lacks the key column the result is empty.
pub fn inner_join(left: &Table, right: &Table, on: &str) -> Table {
    let (Some(left_key), Some(right_key)) = (left.column(on), right.column(on)) else {
        return Table::new();
    };

    let mut right_index: HashMap<String, Vec<usize>> = HashMap::new();
    for row in 0..right.num_rows() {
        if let Some(k) = right_key.values.get(row).key() {
            right_index.entry(k).or_default().push(row);
        }
    }

    let mut left_rows = Vec::new();
    let mut right_rows = Vec::new();
    for row in 0..left.num_rows() {
        let Some(k) = left_key.values.get(row).key() else {
            continue;
        };
        if let Some(matches) = right_index.get(&k) {
            for &r in matches {
                left_rows.push(row);
                right_rows.push(r);
            }
        }
    }

    if left_rows.is_empty() {
        return Table::new();
    }

    let (left_names, right_names) = join_names(left, right, on);

    let mut joined = Table::new();
    joined.push_column(Column::new(on, left_key.values.select(&left_rows)));

    let left_columns = left.columns().iter().filter(|c| c.name != on);
    for (column, name) in left_columns.zip(left_names) {
        joined.push_column(Column::new(name, column.values.select(&left_rows)));
    }

    let right_columns = right.columns().iter().filter(|c| c.name != on);
    for (column, name) in right_columns.zip(right_names) {
        joined.push_column(Column::new(name, column.values.select(&right_rows)));
    }

    joined
}

/// Output names of the non-key columns of each side, in column order.
///
/// A name on both sides takes its side's suffix. Any other name that would
/// clash with an output name already taken or reserved by a suffixed column
/// gets its side's suffix appended until unique.
fn join_names(left: &Table, right: &Table, on: &str) -> (Vec<String>, Vec<String>) {
    let non_key = |table: &Table| -> Vec<String> {
        table
            .column_names()
            .filter(|name| *name != on)
            .map(str::to_string)
            .collect()
    };
    let (left_cols, right_cols) = (non_key(left), non_key(right));

    let mut reserved = HashSet::new();
    for name in left_cols.iter().filter(|n| right.contains(n)) {
        reserved.insert(format!("{}{}", name, DEAL_SUFFIX));
    }
    for name in right_cols.iter().filter(|n| left.contains(n)) {
        reserved.insert(format!("{}{}", name, ORDER_SUFFIX));
    }

    let mut used = HashSet::from([on.to_string()]);
    let mut assign = |names: &[String], other: &Table, suffix: &str| -> Vec<String> {
        names
            .iter()
            .map(|name| {
                let shared = other.contains(name);
                let mut candidate = if shared {
                    format!("{}{}", name, suffix)
                } else {
                    name.clone()
                };
                while used.contains(&candidate) || (!shared && reserved.contains(&candidate)) {
                    candidate.push_str(suffix);
                }
                used.insert(candidate.clone());
                candidate
            })
            .collect()
    };

    let left_names = assign(&left_cols, right, DEAL_SUFFIX);
    let right_names = assign(&right_cols, left, ORDER_SUFFIX);
    (left_names, right_names)
}

/// Name a column takes in [`inner_join`] output, for a column of the given side.
pub fn joined_name(
    name: &str,
    left: &Table,
    right: &Table,
    on: &str,
    left_side: bool,
) -> Option<String> {
    if name == on {
        return (left.contains(on) && right.contains(on)).then(|| on.to_string());
    }

    let (left_names, right_names) = join_names(left, right, on);
    let (own, names) = if left_side {
        (left, left_names)
    } else {
        (right, right_names)
    };

    own.column_names()
        .filter(|n| *n != on)
        .zip(names)
        .find(|(n, _)| *n == name)
        .map(|(_, output)| output)
}

/// Sum `value` over the rows where `filter_column` equals `expected` exactly.
pub fn sum_where(table: &Table, value: &str, filter_column: &str, expected: &str) -> f64 {
    let (Some(value_column), Some(filter)) = (table.column(value), table.column(filter_column)) else {
        return 0.0;
    };
    numeric_values(value_column)
        .iter()
        .enumerate()
        .filter(|(row, _)| filter.values.get(*row) == Cell::Text(expected))
        .map(|(_, v)| v)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Table {
        Table::new()
            .with_column(Column::text(
                "deal_id",
                vec![Some("Sakura"), Some("Naruto"), Some("Kaguya"), Some("Sakura")],
            ))
            .with_column(Column::text(
                "sector",
                vec![Some("Mining"), Some("Mining"), Some("Railways"), None],
            ))
            .with_column(Column::text(
                "Execution Status",
                vec![Some("Completed"), Some("Not Started"), Some("Completed"), Some("Ongoing")],
            ))
            .with_column(Column::number("revenue", vec![10.0, 20.0, 30.0, 40.0]))
    }

    #[test]
    fn test_sum_and_group_sum() {
        let table = orders();
        assert_eq!(sum_column(&table, "revenue"), 100.0);
        assert_eq!(sum_column(&table, "missing"), 0.0);

        let by_sector = group_sum(&table, "sector", "revenue");
        assert_eq!(by_sector.get("Mining"), Some(&30.0));
        assert_eq!(by_sector.get("Railways"), Some(&30.0));
        assert_eq!(by_sector.len(), 2);

        assert!(group_sum(&table, "missing", "revenue").is_empty());
        let no_values = group_sum(&table, "sector", "missing");
        assert_eq!(no_values.get("Mining"), Some(&0.0));
    }

    #[test]
    fn test_text_numbers_are_summed() {
        let table = Table::new().with_column(Column::text("v", vec![Some(" 2.5"), Some("abc"), None]));
        assert_eq!(sum_column(&table, "v"), 2.5);
    }

    #[test]
    fn test_value_counts() {
        let counts = value_counts(&orders(), "Execution Status");
        assert_eq!(counts.get("Completed"), Some(&2));
        assert_eq!(counts.get("Not Started"), Some(&1));
        assert_eq!(counts.get("Ongoing"), Some(&1));
        assert!(value_counts(&orders(), "Deal Stage").is_empty());
    }

    #[test]
    fn test_crosstab_is_dense() {
        let table = orders();
        let tab = crosstab(&table, "Execution Status", "sector");

        // Only rows with both keys count; the null-sector row is skipped.
        assert_eq!(tab.len(), 2);
        assert_eq!(tab["Completed"]["Mining"], 1);
        assert_eq!(tab["Completed"]["Railways"], 1);
        assert_eq!(tab["Not Started"]["Mining"], 1);
        assert_eq!(tab["Not Started"]["Railways"], 0);
        assert!(!tab.contains_key("Ongoing"));
    }

    #[test]
    fn test_inner_join_suffixes_and_multiplicity() {
        let deals = Table::new()
            .with_column(Column::text("deal_id", vec![Some("Sakura"), Some("Orphan")]))
            .with_column(Column::number("revenue", vec![100.0, 5.0]))
            .with_column(Column::text("Deal Stage", vec![Some("Won"), Some("Lost")]));

        let joined = inner_join(&deals, &orders(), "deal_id");

        assert_eq!(joined.num_rows(), 2);
        let names: Vec<_> = joined.column_names().collect();
        assert_eq!(
            names,
            vec![
                "deal_id",
                "revenue_deal",
                "Deal Stage",
                "sector",
                "Execution Status",
                "revenue_order"
            ]
        );
        assert_eq!(
            joined.column("revenue_deal").unwrap().values,
            ColumnValues::Number(vec![100.0, 100.0])
        );
        assert_eq!(
            joined.column("revenue_order").unwrap().values,
            ColumnValues::Number(vec![10.0, 40.0])
        );
    }

    #[test]
    fn test_inner_join_keeps_preexisting_suffixed_column() {
        let deals = Table::new()
            .with_column(Column::text("deal_id", vec![Some("Sakura")]))
            .with_column(Column::number("revenue", vec![100.0]))
            .with_column(Column::number("revenue_deal", vec![7.0]));
        let orders = Table::new()
            .with_column(Column::text("deal_id", vec![Some("Sakura")]))
            .with_column(Column::number("revenue", vec![10.0]));

        let joined = inner_join(&deals, &orders, "deal_id");

        let names: Vec<_> = joined.column_names().collect();
        assert_eq!(
            names,
            vec!["deal_id", "revenue_deal", "revenue_deal_deal", "revenue_order"]
        );
        assert_eq!(
            joined.column("revenue_deal").unwrap().values,
            ColumnValues::Number(vec![100.0])
        );
        assert_eq!(
            joined.column("revenue_deal_deal").unwrap().values,
            ColumnValues::Number(vec![7.0])
        );
        assert_eq!(
            joined_name("revenue_deal", &deals, &orders, "deal_id", true).as_deref(),
            Some("revenue_deal_deal")
        );
        assert_eq!(
            joined_name("revenue", &deals, &orders, "deal_id", false).as_deref(),
            Some("revenue_order")
        );
    }

    #[test]
    fn test_inner_join_without_key_is_empty() {
        let deals = Table::new().with_column(Column::text("name", vec![Some("Sakura")]));
        assert!(inner_join(&deals, &orders(), "deal_id").is_empty());
    }

    #[test]
    fn test_joined_name() {
        let deals = Table::new()
            .with_column(Column::text("deal_id", vec![Some("A")]))
            .with_column(Column::number("revenue", vec![1.0]));
        let bare = Table::new().with_column(Column::text("deal_id", vec![Some("A")]));

        assert_eq!(
            joined_name("revenue", &deals, &orders(), "deal_id", true).as_deref(),
            Some("revenue_deal")
        );
        assert_eq!(
            joined_name("revenue", &deals, &bare, "deal_id", true).as_deref(),
            Some("revenue")
        );
        assert_eq!(joined_name("revenue", &bare, &deals, "deal_id", true), None);
        assert_eq!(
            joined_name("Execution Status", &deals, &orders(), "deal_id", false).as_deref(),
            Some("Execution Status")
        );
    }

    #[test]
    fn test_sum_where() {
        let table = orders();
        assert_eq!(sum_where(&table, "revenue", "Execution Status", "Completed"), 40.0);
        assert_eq!(sum_where(&table, "revenue", "Execution Status", "Paused"), 0.0);
        assert_eq!(sum_where(&table, "revenue", "missing", "Completed"), 0.0);
    }
}

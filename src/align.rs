//! Alignment of the deals and work-order tables onto the canonical schema.
//!
//! The two boards are maintained independently, so the sector and revenue
//! columns have different titles on each. Alignment locates them by
//! case-insensitive keyword search and renames them to [`SECTOR`] and
//! [`REVENUE`], and renames the item-name field to [`DEAL_ID`] so the tables
//! can be joined. Alignment is best-effort and never fails.

use crate::models::{Table, DEAL_ID, ITEM_NAME, REVENUE, SECTOR};
use serde::Serialize;
use tracing::debug;

/// Keyword locating the sector column on both boards.
pub const SECTOR_KEYWORD: &str = "sector";

/// Keyword locating the revenue column on the deals board.
pub const DEALS_REVENUE_KEYWORD: &str = "value";

/// Keyword locating the revenue column on the work-order board.
pub const ORDERS_REVENUE_KEYWORD: &str = "amount";

/// Source columns that were mapped onto canonical names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub deal_id: Option<String>,
    pub sector: Option<String>,
    pub revenue: Option<String>,
}

/// Find the first column, in table order, whose name contains `keyword`
/// ignoring case.
pub fn find_column<'a>(table: &'a Table, keyword: &str) -> Option<&'a str> {
    let needle = keyword.to_lowercase();
    table
        .column_names()
        .find(|name| name.to_lowercase().contains(&needle))
}

/// Align one table, returning the renamed copy and the mapping applied.
///
/// When the sector and revenue searches select the same column it becomes
/// `revenue`. A pre-existing column already named with a canonical name that
/// was not selected is dropped to keep names unique.
pub fn align_table(table: &Table, revenue_keyword: &str) -> (Table, ColumnMapping) {
    let mut mapping = ColumnMapping {
        deal_id: table.contains(ITEM_NAME).then(|| ITEM_NAME.to_string()),
        sector: find_column(table, SECTOR_KEYWORD).map(String::from),
        revenue: find_column(table, revenue_keyword).map(String::from),
    };
    if mapping.sector.is_some() && mapping.sector == mapping.revenue {
        mapping.sector = None;
    }

    let renames: Vec<(&str, &str)> = [
        (mapping.deal_id.as_deref(), DEAL_ID),
        (mapping.sector.as_deref(), SECTOR),
        (mapping.revenue.as_deref(), REVENUE),
    ]
    .into_iter()
    .filter_map(|(source, target)| source.map(|s| (s, target)))
    .collect();

    let mut aligned = table.clone();

    for (_, target) in &renames {
        let occupied_by_other = aligned.contains(target) && !renames.iter().any(|(s, _)| s == target);
        if occupied_by_other {
            debug!("Dropping pre-existing column '{}' shadowed by alignment", target);
            aligned.remove_column(target);
        }
    }

    for (source, target) in &renames {
        aligned.rename_column(source, target);
    }

    debug!("Column mapping: {:?}", mapping);
    (aligned, mapping)
}

/// Align the deals and work-order tables.
pub fn align(deals: &Table, orders: &Table) -> (Table, Table) {
    let (aligned_deals, _) = align_table(deals, DEALS_REVENUE_KEYWORD);
    let (aligned_orders, _) = align_table(orders, ORDERS_REVENUE_KEYWORD);
    (aligned_deals, aligned_orders)
}

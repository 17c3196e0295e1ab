//! The three analysis tools exposed to the agent.
//!
//! Each tool reads the current [`SessionState`], computes a structured
//! result and renders it as a single string. Missing or empty data is
//! reported as a descriptive message rather than an error, so the agent can
//! relay data gaps conversationally.

use crate::analysis::aggregator::{
    crosstab, group_sum, inner_join, joined_name, sum_column, sum_where, value_counts,
};
use crate::models::{Table, DEAL_ID, DEAL_STAGE, EXECUTION_STATUS, REVENUE, SECTOR};
use crate::session::SessionState;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const NO_DEALS_MESSAGE: &str = "No deal data synced.";
pub const NO_ORDERS_MESSAGE: &str = "No work order data synced.";
pub const BOTH_BOARDS_REQUIRED_MESSAGE: &str = "Data from both boards is required for this analysis.";
pub const NO_MATCHES_MESSAGE: &str =
    "No matching records found between Deals and Work Orders using 'Item Name'.";

/// Execution status that marks deal revenue as at risk.
pub const NOT_STARTED: &str = "Not Started";

/// Aggregate view of the sales pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub total_deals: usize,
    pub total_revenue: f64,
    /// Sector -> summed revenue.
    pub sector_breakdown: BTreeMap<String, f64>,
    /// Deal stage -> number of deals.
    pub stage_distribution: BTreeMap<String, usize>,
}

/// Aggregate view of work-order execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionMetrics {
    pub active_projects: usize,
    /// Execution status -> number of work orders.
    pub status_count: BTreeMap<String, usize>,
    /// Execution status -> sector -> number of work orders, dense over both.
    pub sector_progress: BTreeMap<String, BTreeMap<String, usize>>,
}

/// Result of linking deals to their work orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossReference {
    pub matched_records: usize,
    /// Deal revenue of matched work orders that have not started.
    pub revenue_at_risk: f64,
}

macro_rules! display_as_json {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        })*
    };
}

display_as_json!(PipelineSummary, ExecutionMetrics, CrossReference);

pub fn summarize_pipeline(deals: &Table) -> PipelineSummary {
    PipelineSummary {
        total_deals: deals.num_rows(),
        total_revenue: sum_column(deals, REVENUE),
        sector_breakdown: group_sum(deals, SECTOR, REVENUE),
        stage_distribution: value_counts(deals, DEAL_STAGE),
    }
}

pub fn measure_execution(orders: &Table) -> ExecutionMetrics {
    ExecutionMetrics {
        active_projects: orders.num_rows(),
        status_count: value_counts(orders, EXECUTION_STATUS),
        sector_progress: crosstab(orders, EXECUTION_STATUS, SECTOR),
    }
}

/// Join deals to work orders on `deal_id`. `None` when nothing matches.
pub fn cross_reference(deals: &Table, orders: &Table) -> Option<CrossReference> {
    let joined = inner_join(deals, orders, DEAL_ID);
    if joined.is_empty() {
        return None;
    }

    let revenue_at_risk = match (
        joined_name(REVENUE, deals, orders, DEAL_ID, true),
        joined_name(EXECUTION_STATUS, deals, orders, DEAL_ID, false),
    ) {
        (Some(revenue), Some(status)) => sum_where(&joined, &revenue, &status, NOT_STARTED),
        _ => 0.0,
    };

    Some(CrossReference {
        matched_records: joined.num_rows(),
        revenue_at_risk,
    })
}

/// Pipeline summary tool. `_query` is accepted for the tool-calling contract only.
pub fn get_pipeline_summary(state: &SessionState, _query: &str) -> String {
    match state.deals() {
        Some(deals) if !deals.is_empty() => {
            format!("Pipeline Summary: {}", summarize_pipeline(deals))
        }
        _ => NO_DEALS_MESSAGE.to_string(),
    }
}

/// Execution metrics tool.
pub fn get_execution_metrics(state: &SessionState, _query: &str) -> String {
    match state.orders() {
        Some(orders) if !orders.is_empty() => {
            format!("Operational Metrics: {}", measure_execution(orders))
        }
        _ => NO_ORDERS_MESSAGE.to_string(),
    }
}

/// Cross-board bottleneck tool.
pub fn cross_reference_analysis(state: &SessionState, _query: &str) -> String {
    let (Some(deals), Some(orders)) = (state.deals(), state.orders()) else {
        return BOTH_BOARDS_REQUIRED_MESSAGE.to_string();
    };

    match cross_reference(deals, orders) {
        Some(analysis) => format!("Cross-Board Analysis: {}", analysis),
        None => NO_MATCHES_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    fn deals() -> Table {
        Table::new()
            .with_column(Column::text(DEAL_ID, vec![Some("Sakura"), Some("Naruto"), Some("Kaguya")]))
            .with_column(Column::text(SECTOR, vec![Some("Mining"), Some("Mining"), Some("Railways")]))
            .with_column(Column::number(REVENUE, vec![100.0, 50.5, 20.0]))
            .with_column(Column::text(DEAL_STAGE, vec![Some("Won"), Some("Won"), Some("Proposal")]))
    }

    fn orders() -> Table {
        Table::new()
            .with_column(Column::text(DEAL_ID, vec![Some("Sakura"), Some("Kaguya")]))
            .with_column(Column::text(SECTOR, vec![Some("Mining"), Some("Railways")]))
            .with_column(Column::number(REVENUE, vec![80.0, 15.0]))
            .with_column(Column::text(
                EXECUTION_STATUS,
                vec![Some("Not Started"), Some("Completed")],
            ))
    }

    fn synced(deals: Table, orders: Table) -> SessionState {
        let mut state = SessionState::new();
        state.replace(deals, orders);
        state
    }

    #[test]
    fn test_pipeline_summary() {
        let summary = summarize_pipeline(&deals());
        assert_eq!(summary.total_deals, 3);
        assert_eq!(summary.total_revenue, 170.5);
        assert_eq!(summary.sector_breakdown.get("Mining"), Some(&150.5));
        assert_eq!(summary.stage_distribution.get("Won"), Some(&2));

        let text = get_pipeline_summary(&synced(deals(), orders()), "how is the pipeline?");
        assert!(text.starts_with("Pipeline Summary: {"));
        assert!(text.contains("\"total_deals\":3"));
    }

    #[test]
    fn test_pipeline_summary_without_data() {
        assert_eq!(get_pipeline_summary(&SessionState::new(), ""), NO_DEALS_MESSAGE);
        assert_eq!(
            get_pipeline_summary(&synced(Table::new(), orders()), ""),
            "No deal data synced."
        );
    }

    #[test]
    fn test_pipeline_summary_without_sector_column() {
        let mut table = deals();
        table.remove_column(SECTOR);
        let summary = summarize_pipeline(&table);
        assert!(summary.sector_breakdown.is_empty());
        assert_eq!(summary.total_revenue, 170.5);
    }

    #[test]
    fn test_execution_metrics_dense_crosstab() {
        let metrics = measure_execution(&orders());
        assert_eq!(metrics.active_projects, 2);
        assert_eq!(metrics.status_count.get("Completed"), Some(&1));
        assert_eq!(metrics.sector_progress["Not Started"]["Mining"], 1);
        assert_eq!(metrics.sector_progress["Not Started"]["Railways"], 0);
        assert_eq!(metrics.sector_progress["Completed"]["Mining"], 0);
        assert_eq!(metrics.sector_progress["Completed"]["Railways"], 1);

        let text = get_execution_metrics(&synced(deals(), orders()), "");
        assert!(text.starts_with("Operational Metrics: "));
    }

    #[test]
    fn test_execution_metrics_without_data() {
        assert_eq!(get_execution_metrics(&SessionState::new(), ""), NO_ORDERS_MESSAGE);
        assert_eq!(get_execution_metrics(&synced(deals(), Table::new()), ""), NO_ORDERS_MESSAGE);
    }

    #[test]
    fn test_cross_reference_revenue_at_risk() {
        let deals = Table::new()
            .with_column(Column::text(DEAL_ID, vec![Some("Sakura")]))
            .with_column(Column::number(REVENUE, vec![100.0]));
        let orders = Table::new()
            .with_column(Column::text(DEAL_ID, vec![Some("Sakura")]))
            .with_column(Column::text(EXECUTION_STATUS, vec![Some("Not Started")]));

        let analysis = cross_reference(&deals, &orders).unwrap();
        assert_eq!(analysis.matched_records, 1);
        assert_eq!(analysis.revenue_at_risk, 100.0);
    }

    #[test]
    fn test_cross_reference_uses_deal_side_revenue() {
        let analysis = cross_reference(&deals(), &orders()).unwrap();
        assert_eq!(analysis.matched_records, 2);
        assert_eq!(analysis.revenue_at_risk, 100.0);

        let text = cross_reference_analysis(&synced(deals(), orders()), "bottlenecks?");
        assert_eq!(
            text,
            "Cross-Board Analysis: {\"matched_records\":2,\"revenue_at_risk\":100.0}"
        );
    }

    #[test]
    fn test_cross_reference_disjoint_ids() {
        let orders = Table::new()
            .with_column(Column::text(DEAL_ID, vec![Some("Boruto")]))
            .with_column(Column::text(EXECUTION_STATUS, vec![Some("Not Started")]));

        assert_eq!(cross_reference(&deals(), &orders), None);
        assert_eq!(
            cross_reference_analysis(&synced(deals(), orders), ""),
            NO_MATCHES_MESSAGE
        );
    }

    #[test]
    fn test_cross_reference_requires_both_tables() {
        let message = cross_reference_analysis(&SessionState::new(), "");
        assert_eq!(message, BOTH_BOARDS_REQUIRED_MESSAGE);
        assert_ne!(message, NO_MATCHES_MESSAGE);
    }
}

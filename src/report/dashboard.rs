//! Headline metrics shown after a sync.

use crate::analysis::aggregator::{numeric_values, sum_column};
use crate::models::{Cell, Table, REVENUE, SECTOR};
use crate::session::SessionState;
use serde::Serialize;
use std::fmt;

/// Overall data availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SystemStatus {
    Operational,
    NoData,
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemStatus::Operational => write!(f, "Operational"),
            SystemStatus::NoData => write!(f, "No Data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub total_pipeline_value: f64,
    pub active_work_orders: usize,
    pub focus_sector: String,
    pub focus_sector_value: f64,
    pub status: SystemStatus,
}

impl HeadlineMetrics {
    pub fn from_state(state: &SessionState, focus_sector: &str) -> Self {
        let deals = state.deals().filter(|d| !d.is_empty());

        Self {
            total_pipeline_value: deals.map_or(0.0, |d| sum_column(d, REVENUE)),
            active_work_orders: state.orders().map_or(0, Table::num_rows),
            focus_sector: focus_sector.to_string(),
            focus_sector_value: deals.map_or(0.0, |d| sector_value(d, focus_sector)),
            status: if deals.is_some() {
                SystemStatus::Operational
            } else {
                SystemStatus::NoData
            },
        }
    }
}

/// Revenue of the rows whose sector contains `sector` (case-sensitive).
pub fn sector_value(deals: &Table, sector: &str) -> f64 {
    let (Some(sectors), Some(revenue)) = (deals.column(SECTOR), deals.column(REVENUE)) else {
        return 0.0;
    };

    numeric_values(revenue)
        .iter()
        .enumerate()
        .filter(|(row, _)| matches!(sectors.values.get(*row), Cell::Text(s) if s.contains(sector)))
        .map(|(_, v)| v)
        .sum()
}

/// Format an amount as `INR 1,234,567.89`.
pub fn format_inr(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("INR {}{}.{}", sign, grouped, fraction)
}

/// Render the dashboard block printed after a sync.
pub fn render_dashboard(metrics: &HeadlineMetrics) -> String {
    let mut output = String::new();

    output.push_str("📊 Business Dashboard\n");
    output.push_str(&format!(
        "   Total Pipeline Value: {}\n",
        format_inr(metrics.total_pipeline_value)
    ));
    output.push_str(&format!(
        "   Active Work Orders:   {}\n",
        metrics.active_work_orders
    ));
    output.push_str(&format!(
        "   {} Sector Value: {}\n",
        metrics.focus_sector,
        format_inr(metrics.focus_sector_value)
    ));
    output.push_str(&format!("   System Status:        {}\n", metrics.status));

    output
}

//! Audit export generation.
//!
//! Dumps the synchronized tables so the cleaned data behind every answer
//! can be checked by hand.

use crate::models::Table;
use crate::report::dashboard::{format_inr, HeadlineMetrics};
use crate::session::SessionState;
use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

/// Generate a complete Markdown export.
pub fn generate_markdown_export(state: &SessionState, metrics: &HeadlineMetrics) -> String {
    let mut output = String::new();

    output.push_str("# BoardSight Data Audit\n\n");
    output.push_str(&generate_metadata_section(state, metrics));
    output.push_str(&generate_table_section("Deals", state.deals()));
    output.push_str(&generate_table_section("Work Orders", state.orders()));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(state: &SessionState, metrics: &HeadlineMetrics) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    match state.synced_at() {
        Some(at) => section.push_str(&format!(
            "- **Synced At:** {}\n",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        )),
        None => section.push_str("- **Synced At:** never\n"),
    }
    section.push_str(&format!(
        "- **Total Pipeline Value:** {}\n",
        format_inr(metrics.total_pipeline_value)
    ));
    section.push_str(&format!(
        "- **Active Work Orders:** {}\n",
        metrics.active_work_orders
    ));
    section.push_str(&format!(
        "- **{} Sector Value:** {}\n",
        metrics.focus_sector,
        format_inr(metrics.focus_sector_value)
    ));
    section.push_str(&format!("- **System Status:** {}\n\n", metrics.status));

    section
}

fn generate_table_section(title: &str, table: Option<&Table>) -> String {
    let mut section = String::new();

    let Some(table) = table.filter(|t| !t.is_empty()) else {
        section.push_str(&format!("## {}\n\n_No data._\n\n", title));
        return section;
    };

    section.push_str(&format!("## {} ({} rows)\n\n", title, table.num_rows()));
    section.push_str(&markdown_table(table));
    section.push('\n');

    section
}

/// Render a table as a Markdown pipe table.
pub fn markdown_table(table: &Table) -> String {
    let mut output = String::new();

    let header: Vec<_> = table.column_names().map(escape_cell).collect();
    output.push_str(&format!("| {} |\n", header.join(" | ")));
    output.push_str(&format!("|{}\n", ":---|".repeat(header.len())));

    for row in 0..table.num_rows() {
        let cells: Vec<_> = table
            .columns()
            .iter()
            .map(|c| escape_cell(&c.values.get(row).to_string()))
            .collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    output
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn generate_footer() -> String {
    "---\n\n*Generated by BoardSight*\n".to_string()
}

/// Generate a JSON export.
pub fn generate_json_export(state: &SessionState, metrics: &HeadlineMetrics) -> Result<String> {
    let rows = |table: Option<&Table>| table.map(Table::to_json_rows).unwrap_or_default();

    let export = json!({
        "synced_at": state.synced_at(),
        "metrics": metrics,
        "deals": rows(state.deals()),
        "work_orders": rows(state.orders()),
    });

    serde_json::to_string_pretty(&export).map_err(Into::into)
}

/// Write an export to a file.
pub fn write_export(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write export to {}", path.display()))
}

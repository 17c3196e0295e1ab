//! Analysis over the synchronized boards.
//!
//! [`aggregator`] holds the table primitives (sums, counts, crosstabs and
//! joins); [`insights`] builds the three agent-facing tools on top of them.

pub mod aggregator;
pub mod insights;

pub use insights::{cross_reference_analysis, get_execution_metrics, get_pipeline_summary};

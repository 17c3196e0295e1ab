//! Dashboard rendering and audit exports.

pub mod dashboard;
pub mod generator;

pub use dashboard::{render_dashboard, HeadlineMetrics};
pub use generator::{generate_json_export, generate_markdown_export, write_export};

//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// BoardSight - ask business questions about your monday.com boards
///
/// Syncs a Deals board and a Work Orders board, cleans and aligns them,
/// and answers questions through an LLM agent with analysis tools.
///
/// Examples:
///   boardsight --deals-board 123 --orders-board 456 --ask "Where is revenue stuck?"
///   boardsight --chat
///   boardsight --no-agent --export audit.md
///   boardsight --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Ask a single question and exit
    #[arg(short, long, value_name = "QUESTION", conflicts_with = "chat")]
    pub ask: Option<String>,

    /// Start an interactive question session
    #[arg(long)]
    pub chat: bool,

    /// monday.com board ID of the Deals board
    #[arg(long, value_name = "ID", env = "BOARDSIGHT_DEALS_BOARD")]
    pub deals_board: Option<String>,

    /// monday.com board ID of the Work Orders board
    #[arg(long, value_name = "ID", env = "BOARDSIGHT_ORDERS_BOARD")]
    pub orders_board: Option<String>,

    /// monday.com API token
    #[arg(long, value_name = "KEY", env = "MONDAY_API_KEY", hide_env_values = true)]
    pub monday_api_key: Option<String>,

    /// API key for the LLM provider
    #[arg(long, value_name = "KEY", env = "GROQ_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Model to use for the agent
    ///
    /// Can also be set via BOARDSIGHT_MODEL env var or .boardsight.toml config.
    #[arg(short, long, env = "BOARDSIGHT_MODEL")]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, value_name = "URL", env = "BOARDSIGHT_LLM_URL")]
    pub llm_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Sector highlighted on the dashboard
    #[arg(long, value_name = "SECTOR")]
    pub focus_sector: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .boardsight.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the synchronized tables to a file for audit
    #[arg(short, long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Export format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Print the analysis tool outputs without calling the LLM
    #[arg(long)]
    pub no_agent: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .boardsight.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.llm_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("LLM URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.ask.is_some() && self.chat {
            return Err("Cannot use both --ask and --chat".to_string());
        }

        if let Some(ref question) = self.ask {
            if question.trim().is_empty() {
                return Err("Question for --ask must not be empty".to_string());
            }
        }

        if self.no_agent && (self.ask.is_some() || self.chat) {
            return Err("--no-agent cannot be combined with --ask or --chat".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Whether a question will be sent to the LLM.
    pub fn uses_agent(&self) -> bool {
        !self.no_agent && (self.ask.is_some() || self.chat)
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `verbose` from the config file. `--quiet` wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

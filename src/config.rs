//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.boardsight.toml` files. API keys are never read from the file.

use crate::normalize::{default_date_keywords, default_missing_text, default_numeric_keywords};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".boardsight.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// monday.com API settings.
    #[serde(default)]
    pub monday: MondayConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Column classification settings.
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Sector highlighted on the dashboard.
    #[serde(default = "default_focus_sector")]
    pub focus_sector: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            focus_sector: default_focus_sector(),
        }
    }
}

fn default_focus_sector() -> String {
    "Mining".to_string()
}

/// monday.com board source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MondayConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Value of the `API-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Board holding the sales pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deals_board_id: Option<String>,

    /// Board holding the work orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders_board_id: Option<String>,

    /// Items requested per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Maximum pages fetched per board.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_monday_timeout")]
    pub timeout_seconds: u64,
}

impl Default for MondayConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_version: default_api_version(),
            deals_board_id: None,
            orders_board_id: None,
            page_limit: default_page_limit(),
            max_pages: default_max_pages(),
            timeout_seconds: default_monday_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.monday.com/v2".to_string()
}

fn default_api_version() -> String {
    "2024-01".to_string()
}

fn default_page_limit() -> u32 {
    100
}

fn default_max_pages() -> usize {
    10
}

fn default_monday_timeout() -> u64 {
    30
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// OpenAI-compatible API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Temperature for generation.
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,

    /// Tool rounds allowed per question.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            base_url: default_base_url(),
            temperature: 0.0,
            timeout_seconds: default_model_timeout(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model_timeout() -> u64 {
    120
}

fn default_max_iterations() -> usize {
    8
}

/// Keyword rules for column classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Case-sensitive substrings marking numeric columns.
    #[serde(default = "default_numeric_keywords")]
    pub numeric_keywords: Vec<String>,

    /// Case-sensitive substrings marking date columns.
    #[serde(default = "default_date_keywords")]
    pub date_keywords: Vec<String>,

    /// Placeholder for missing text cells.
    #[serde(default = "default_missing_text")]
    pub missing_text: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            numeric_keywords: default_numeric_keywords(),
            date_keywords: default_date_keywords(),
            missing_text: default_missing_text(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref board) = args.deals_board {
            self.monday.deals_board_id = Some(board.clone());
        }
        if let Some(ref board) = args.orders_board {
            self.monday.orders_board_id = Some(board.clone());
        }

        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.llm_url {
            self.model.base_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }

        if let Some(ref sector) = args.focus_sector {
            self.general.focus_sector = sector.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Agent settings derived from the model section.
    pub fn agent_config(&self) -> crate::agent::AgentConfig {
        crate::agent::AgentConfig {
            base_url: self.model.base_url.clone(),
            model_name: self.model.name.clone(),
            temperature: self.model.temperature,
            max_iterations: self.model.max_iterations,
            timeout_seconds: self.model.timeout_seconds,
            ..Default::default()
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

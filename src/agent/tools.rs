//! Tool definitions for the business-intelligence agent.
//!
//! Each analysis tool is registered once in [`TOOLS`] with its name and
//! description. The registry drives both the schema sent to the model and
//! the executor's routing.

use crate::analysis::{cross_reference_analysis, get_execution_metrics, get_pipeline_summary};
use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Tool definition in the chat-completions `tools` format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool call made by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, as sent by the model.
    #[serde(default)]
    pub arguments: String,
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message),
        }
    }

    /// Text handed back to the model.
    pub fn content(&self) -> String {
        match &self.error {
            Some(e) => format!("Error: {}", e),
            None => self.output.clone(),
        }
    }
}

/// A registered analysis tool.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: fn(&SessionState, &str) -> String,
}

/// Every tool the agent may call.
pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "get_pipeline_summary",
        description: "Summarize the sales pipeline: deal count, total revenue, revenue by sector and deals per stage.",
        handler: get_pipeline_summary,
    },
    ToolSpec {
        name: "get_execution_metrics",
        description: "Report work-order execution: active projects, orders per execution status and status counts per sector.",
        handler: get_execution_metrics,
    },
    ToolSpec {
        name: "cross_reference_analysis",
        description: "Link deals to work orders by item name and report matched records and deal revenue whose execution has not started.",
        handler: cross_reference_analysis,
    },
];

/// Look up a tool by name.
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

/// Routes tool calls to the analysis tools against a session.
pub struct ToolExecutor<'a> {
    state: &'a SessionState,
}

impl<'a> ToolExecutor<'a> {
    pub fn new(state: &'a SessionState) -> Self {
        Self { state }
    }

    /// Execute a tool call and return the result.
    pub fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        let name = &tool_call.function.name;
        debug!(
            "Executing tool: {} with args: {}",
            name, tool_call.function.arguments
        );

        match find_tool(name) {
            Some(tool) => {
                let query = extract_query(&tool_call.function.arguments);
                ToolResult::success((tool.handler)(self.state, &query))
            }
            None => ToolResult::error(format!("Unknown tool: {}", name)),
        }
    }
}

/// Pull the `query` string out of the raw arguments. Anything missing or
/// malformed yields an empty query.
fn extract_query(arguments: &str) -> String {
    serde_json::from_str::<Value>(arguments)
        .ok()
        .and_then(|v| v.get("query").and_then(|q| q.as_str()).map(String::from))
        .unwrap_or_default()
}

/// Get the tool definitions for the chat-completions API.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOLS
        .iter()
        .map(|tool| ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: tool.name.to_string(),
                description: tool.description.to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The user's question or the focus of the analysis"
                        }
                    },
                    "required": []
                }),
            },
        })
        .collect()
}

//! Agent loop for tool-based business analysis.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. Each question is
//! appended to a running conversation; the model may call the analysis tools
//! any number of times before answering in plain text.

use crate::agent::tools::{get_tool_definitions, ToolCall, ToolDefinition, ToolExecutor};
use crate::session::SessionState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub base_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_iterations: usize,
    pub timeout_seconds: u64,
    /// Messages kept after the system prompt before whole exchanges are pruned
    pub max_context_messages: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model_name: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.0,
            max_iterations: 8,
            timeout_seconds: 120,
            max_context_messages: 40,
        }
    }
}

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self::text("system", content)
    }

    fn user(content: &str) -> Self {
        Self::text("user", content)
    }

    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool(tool_call_id: &str, content: String) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
        }
    }
}

/// Chat-completions request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: Vec<ToolDefinition>,
    tool_choice: &'static str,
    temperature: f32,
}

/// Chat-completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// The business-intelligence agent.
pub struct BiAgent {
    config: AgentConfig,
    api_key: String,
    http_client: reqwest::Client,
    messages: Vec<ChatMessage>,
}

impl BiAgent {
    /// Create a new agent with an empty conversation.
    pub fn new(config: AgentConfig, api_key: String) -> Result<Self> {
        info!("Initializing agent with model {}", config.model_name);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            api_key,
            http_client,
            messages: vec![ChatMessage::system(AGENT_SYSTEM_PROMPT)],
        })
    }

    /// Ask a question and run the tool loop until the model answers.
    pub async fn ask(&mut self, state: &SessionState, question: &str) -> Result<String> {
        self.prune_old_messages();
        self.messages.push(ChatMessage::user(question));

        let executor = ToolExecutor::new(state);

        for iteration in 0..self.config.max_iterations {
            debug!("Agent iteration {}", iteration + 1);

            let response = self.chat_with_tools().await?;
            let tool_calls = response.tool_calls.clone().unwrap_or_default();
            self.messages.push(response.clone());

            if tool_calls.is_empty() {
                return Ok(response.content.unwrap_or_default());
            }

            for tool_call in &tool_calls {
                let result = executor.execute(tool_call);
                info!("Tool {} executed", tool_call.function.name);
                self.messages
                    .push(ChatMessage::tool(&tool_call.id, result.content()));
            }
        }

        warn!(
            "Agent reached {} iterations without a final answer",
            self.config.max_iterations
        );
        Err(anyhow::anyhow!(
            "No answer after {} tool rounds. Try a more specific question.",
            self.config.max_iterations
        ))
    }

    /// Number of messages in the conversation, system prompt included.
    pub fn history_len(&self) -> usize {
        self.messages.len()
    }

    /// Drop the oldest whole exchanges until the history fits.
    ///
    /// The system prompt is always kept, and the history after it always
    /// starts at a user message so tool results stay paired with the
    /// assistant message that requested them.
    fn prune_old_messages(&mut self) {
        let limit = self.config.max_context_messages + 1;
        let mut removed = 0;

        while self.messages.len() > limit {
            let next_user = self
                .messages
                .iter()
                .skip(2)
                .position(|m| m.role == "user")
                .map(|p| p + 2);

            match next_user {
                Some(end) => {
                    removed += end - 1;
                    self.messages.drain(1..end);
                }
                None => break,
            }
        }

        if removed > 0 {
            debug!("Pruned {} old messages to save context", removed);
        }
    }

    /// Send the conversation with the tool definitions.
    async fn chat_with_tools(&self) -> Result<ChatMessage> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: &self.config.model_name,
            messages: &self.messages,
            tools: get_tool_definitions(),
            tool_choice: "auto",
            temperature: self.config.temperature,
        };

        debug!("Sending chat request with {} messages", self.messages.len());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!(
                        "Request timed out after {}s",
                        self.config.timeout_seconds
                    )
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to model API at {}", self.config.base_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Model API error {}: {}", status, body));
        }

        let body = response
            .text()
            .await
            .context("Failed to read model response")?;
        parse_completion(&body)
    }
}

/// Extract the first choice's message from a chat-completions body.
fn parse_completion(body: &str) -> Result<ChatMessage> {
    let response: ChatResponse =
        serde_json::from_str(body).context("Failed to parse model response")?;
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .context("Model response contained no choices")
}

/// System prompt for the analyst persona
const AGENT_SYSTEM_PROMPT: &str = r#"You are a business-intelligence analyst answering questions from company leadership about the sales pipeline and project execution.

## Data

Two monday.com boards are synchronized: Deals (the sales pipeline) and Work Orders (execution). A deal and its work order share the same item name, which links revenue to delivery.

## Tools

- `get_pipeline_summary` - deal count, total revenue, revenue by sector, deals per stage
- `get_execution_metrics` - active work orders, orders per execution status, status by sector
- `cross_reference_analysis` - deals matched to work orders and revenue whose execution has not started

Call the tools you need before answering. Never invent numbers.

## Answer Format

1. **Summary** - the direct answer in one or two sentences
2. **Key Metrics** - the figures that support it
3. **Caveats** - missing boards, unmatched records, placeholder values such as "Not Provided"

If a sector carries high revenue while its execution is "Not Started", call it out as a bottleneck.
"#;

//! Anthropic (Claude) API client implementation.
//!
//! Uses the Messages API. The system prompt travels in its own field, and the
//! server-side web search tool is attached when web search is enabled.
//! See: https://docs.anthropic.com/en/api/messages

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::provider::retry_after;
use super::{ChatMessage, ChatRequest, LlmConfig, LlmProvider, Provider, ProviderError, ProviderResult};
use crate::conversation::ChatReply;

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Server-side web search tool type.
const WEB_SEARCH_TOOL: &str = "web_search_20250305";

/// Upper bound on searches per turn.
const WEB_SEARCH_MAX_USES: u32 = 5;

/// Request body for Anthropic Messages API.
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

/// Message format for Anthropic API.
/// Note: Anthropic only supports "user" and "assistant" roles.
/// System prompts are passed as a separate field.
#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    #[serde(rename = "type")]
    tool_type: String,
    name: String,
    max_uses: u32,
}

/// Response body; only text blocks are kept.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

/// Error response from Anthropic API.
#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Anthropic API client.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    config: Arc<LlmConfig>,
}

impl AnthropicClient {
    /// Create a new Anthropic client with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn build_request(&self, request: &ChatRequest) -> AnthropicRequest {
        let (system, messages) = convert_messages(&request.messages);
        let tools = if self.config.web_search {
            vec![AnthropicTool {
                tool_type: WEB_SEARCH_TOOL.to_string(),
                name: "web_search".to_string(),
                max_uses: WEB_SEARCH_MAX_USES,
            }]
        } else {
            Vec::new()
        };

        AnthropicRequest {
            model: request.model.clone(),
            messages,
            // Anthropic requires max_tokens
            max_tokens: self.config.max_tokens.unwrap_or(4096),
            temperature: self.config.temperature,
            system,
            tools,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn complete(&self, request: &ChatRequest) -> ProviderResult<ChatReply> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(format!(
                "{} not set",
                Provider::Anthropic.env_var_name()
            )));
        }
        if request.messages.is_empty() {
            return Err(ProviderError::InvalidRequest("messages[] required".to_string()));
        }

        let url = format!("{}/messages", self.config.api_base.trim_end_matches('/'));
        let body = self.build_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry = retry_after(&response);
            let body = response.text().await.unwrap_or_default();

            // Try to parse as Anthropic error format
            let message = match serde_json::from_str::<AnthropicError>(&body) {
                Ok(error) => format!("{} - {}", error.error.error_type, error.error.message),
                Err(_) => body,
            };
            return Err(ProviderError::from_status(status, message, retry));
        }

        let parsed: AnthropicResponse = response.json().await?;
        Ok(ChatReply::text(parsed.text().trim().to_string()).with_web(self.config.web_search))
    }
}

impl AnthropicResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect()
    }
}

/// Convert generic ChatMessages to Anthropic format.
/// Extracts system messages into a separate field.
fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system = None;
    let mut anthropic_messages = Vec::new();

    for msg in messages {
        if msg.role == "system" {
            // Anthropic uses a separate system field, not in messages array
            system = Some(msg.content.clone());
        } else {
            anthropic_messages.push(AnthropicMessage {
                role: msg.role.clone(),
                content: msg.content.clone(),
            });
        }
    }

    (system, anthropic_messages)
}

//! OpenAI provider.
//!
//! With web search enabled, the conversation is flattened into a single
//! input and sent to the Responses API with the `web_search` tool. If that
//! fails or produces no text, the request falls back to chat completions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::provider::retry_after;
use super::{ChatMessage, ChatRequest, LlmConfig, LlmProvider, Provider, ProviderError, ProviderResult};
use crate::conversation::ChatReply;

/// OpenAI provider.
pub struct OpenAiProvider {
    client: Client,
    config: Arc<LlmConfig>,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Ask the Responses API with web search. `Ok(None)` means no text came back.
    async fn web_search(&self, request: &ChatRequest) -> ProviderResult<Option<String>> {
        let body = ResponsesRequest {
            model: request.model.clone(),
            input: flatten_conversation(&request.messages),
            tools: vec![WebSearchTool {
                tool_type: "web_search".to_string(),
            }],
            tool_choice: "auto".to_string(),
            store: false,
        };

        let response = self
            .client
            .post(self.url("responses"))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let parsed: ResponsesResponse = response.json().await?;
        let text = parsed.text();
        let text = text.trim();

        Ok(if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        })
    }

    async fn chat_completion(&self, request: &ChatRequest) -> ProviderResult<String> {
        let body = ChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.url("chat/completions"))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let parsed: ChatCompletionResponse = response.json().await?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn complete(&self, request: &ChatRequest) -> ProviderResult<ChatReply> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(format!(
                "{} not set",
                Provider::OpenAi.env_var_name()
            )));
        }
        if request.messages.is_empty() {
            return Err(ProviderError::InvalidRequest("messages[] required".to_string()));
        }

        if self.config.web_search {
            match self.web_search(request).await {
                Ok(Some(text)) => return Ok(ChatReply::text(text).with_web(true)),
                Ok(None) => warn!("web search returned no text, falling back to chat completions"),
                Err(err) => warn!(error = %err, "web search failed, falling back to chat completions"),
            }
        }

        let text = self.chat_completion(request).await?;
        debug!(chars = text.len(), "chat completion finished");
        Ok(ChatReply::text(text))
    }
}

/// Join the conversation into `Role: content` paragraphs.
fn flatten_conversation(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| matches!(m.role.as_str(), "system" | "user" | "assistant"))
        .map(|m| format!("{}: {}", capitalize(&m.role), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn a non-success response into a `ProviderError`.
async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry = retry_after(&response);
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<OpenAiErrorBody>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(ProviderError::from_status(status, message, retry))
}

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Responses API request body.
#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    input: String,
    tools: Vec<WebSearchTool>,
    tool_choice: String,
    store: bool,
}

#[derive(Debug, Serialize)]
struct WebSearchTool {
    #[serde(rename = "type")]
    tool_type: String,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

impl ResponsesResponse {
    /// Concatenated output text of every message item.
    fn text(&self) -> String {
        if let Some(text) = self.output_text.as_deref().filter(|t| !t.is_empty()) {
            return text.to_string();
        }

        self.output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.part_type == "output_text")
            .map(|part| part.text.as_str())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    part_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            messages,
            model: "gpt-4o-mini".to_string(),
            source: "none".to_string(),
        }
    }

    #[test]
    fn test_flatten_conversation() {
        let messages = vec![
            ChatMessage::new("system", "Be brief."),
            ChatMessage::new("user", "Hi"),
            ChatMessage::new("tool", "ignored"),
            ChatMessage::new("assistant", "Hello!"),
        ];
        assert_eq!(
            flatten_conversation(&messages),
            "System: Be brief.\n\nUser: Hi\n\nAssistant: Hello!"
        );
    }

    #[test]
    fn test_responses_request_serialization() {
        let body = ResponsesRequest {
            model: "gpt-4o-mini".to_string(),
            input: "User: Hi".to_string(),
            tools: vec![WebSearchTool {
                tool_type: "web_search".to_string(),
            }],
            tool_choice: "auto".to_string(),
            store: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["tools"][0]["type"], "web_search");
        assert_eq!(json["tool_choice"], "auto");
        assert_eq!(json["store"], false);
    }

    #[test]
    fn test_chat_request_omits_unset_options() {
        let body = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::new("user", "Hi")],
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn test_parse_responses_output() {
        let json = r#"{
            "output": [
                {"type": "web_search_call", "id": "ws_1", "status": "completed"},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Rates are ", "annotations": []},
                    {"type": "output_text", "text": "posted online."}
                ]}
            ]
        }"#;
        let parsed: ResponsesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), "Rates are posted online.");
    }

    #[test]
    fn test_parse_responses_prefers_output_text() {
        let json = r#"{"output_text": "direct", "output": []}"#;
        let parsed: ResponsesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), "direct");
    }

    #[test]
    fn test_parse_chat_completion_null_content() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_parse_error_body() {
        let json = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        let parsed: OpenAiErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.error.message, "Incorrect API key provided");
    }

    #[tokio::test]
    async fn test_complete_without_key() {
        let provider = OpenAiProvider::new(LlmConfig::for_provider(Provider::OpenAi));
        let err = provider
            .complete(&request(vec![ChatMessage::new("user", "Hi")]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Provider not configured: OPENAI_API_KEY not set");
    }

    #[tokio::test]
    async fn test_complete_requires_messages() {
        let mut config = LlmConfig::for_provider(Provider::OpenAi);
        config.api_key = "sk-test".to_string();
        let provider = OpenAiProvider::new(config);
        let err = provider.complete(&request(Vec::new())).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }
}

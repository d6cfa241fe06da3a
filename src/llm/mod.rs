//! LLM client module for API interactions.
//!
//! Two providers are supported:
//! - OpenAI (chat completions, with web search through the Responses API)
//! - Anthropic (Messages API, with the server-side web search tool)
//!
//! The provider for a turn is chosen from the selected model.

mod anthropic;
mod openai;
mod provider;

pub use provider::{LlmProvider, ProviderError, ProviderResult};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

pub use anthropic::AnthropicClient;
pub use openai::OpenAiProvider;

use crate::config::LlmConfigFile;
use crate::conversation::ChatReply;
use crate::message::Message;

/// Marker in a model id that selects a long-running research model.
pub const DEEP_RESEARCH_MARKER: &str = "deep-research";

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

impl Provider {
    /// Returns all available providers in display order.
    pub const fn all() -> &'static [Provider] {
        &[Provider::OpenAi, Provider::Anthropic]
    }

    /// Get the display name for this provider.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Get the default API base URL for this provider.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Get the environment variable name for the API key.
    pub fn env_var_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Get the environment variable name for the API base override.
    pub fn api_base_env_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_BASE",
            Provider::Anthropic => "ANTHROPIC_API_BASE",
        }
    }

    /// Pick the provider that serves a model.
    pub fn for_model(model: &str) -> Provider {
        if model.trim().to_ascii_lowercase().starts_with("claude") {
            Provider::Anthropic
        } else {
            Provider::OpenAi
        }
    }
}

/// Returns true if the model is a deep-research model.
///
/// Only the waiting status text changes for these models.
pub fn is_deep_research(model: &str) -> bool {
    model.to_ascii_lowercase().contains(DEEP_RESEARCH_MARKER)
}

/// Chat message for API requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role.as_str(), &message.content)
    }
}

/// One outbound turn: the full conversation plus the caller's selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub source: String,
}

/// LLM client configuration for one provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub api_base: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub web_search: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::for_provider(Provider::default())
    }
}

impl LlmConfig {
    /// Default configuration for a provider, without an API key.
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            provider,
            api_base: provider.default_api_base().to_string(),
            api_key: String::new(),
            temperature: Some(0.7),
            max_tokens: Some(4096),
            web_search: true,
        }
    }

    /// Check if the client is configured with an API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Load from environment variables, with file config as fallback.
    pub fn from_env_and_config(provider: Provider, file_config: Option<&LlmConfigFile>) -> Self {
        let mut config = Self::for_provider(provider);

        // First apply file config if present
        if let Some(fc) = file_config {
            let section = fc.provider(provider);
            if let Some(ref base) = section.api_base {
                config.api_base = base.clone();
            }
            if let Some(ref key) = section.api_key {
                config.api_key = key.clone();
            }
            config.temperature = fc.temperature;
            config.max_tokens = fc.max_tokens;
            config.web_search = fc.web_search;
        }

        // Environment variables override file config
        if let Ok(key) = std::env::var(provider.env_var_name()) {
            config.api_key = key;
        }

        if let Ok(base) = std::env::var(provider.api_base_env_var()) {
            config.api_base = base;
        }

        config
    }
}

/// LLM client for making API calls.
///
/// Holds one provider per backend and routes each request by model.
#[derive(Clone)]
pub struct LlmClient {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl LlmClient {
    /// Create a client with both providers, configured from file and env.
    pub fn new(file_config: Option<&LlmConfigFile>) -> Self {
        let providers: Vec<Arc<dyn LlmProvider>> = Provider::all()
            .iter()
            .map(|&provider| {
                let config = LlmConfig::from_env_and_config(provider, file_config);
                let provider: Arc<dyn LlmProvider> = match provider {
                    Provider::OpenAi => Arc::new(OpenAiProvider::new(config)),
                    Provider::Anthropic => Arc::new(AnthropicClient::new(config)),
                };
                provider
            })
            .collect();

        Self { providers }
    }

    /// Create a new LLM client from an existing provider.
    ///
    /// Use this when you have a custom or pre-configured provider.
    pub fn from_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            providers: vec![provider],
        }
    }

    /// Create a client from an explicit provider list.
    pub fn with_providers(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Find the provider serving a model.
    pub fn provider_for(&self, model: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers
            .iter()
            .find(|p| p.handles_model(model))
            .cloned()
    }

    /// Check if the provider for a model has credentials.
    pub fn is_configured_for(&self, model: &str) -> bool {
        self.provider_for(model)
            .map(|p| p.is_configured())
            .unwrap_or(false)
    }

    /// Run one request to completion, folding every failure into the reply.
    pub async fn complete(&self, request: &ChatRequest) -> ChatReply {
        let Some(provider) = self.provider_for(&request.model) else {
            let err = ProviderError::NotConfigured(format!("no provider for model {}", request.model));
            error!(model = %request.model, "{}", err);
            return ChatReply::error(err.reply_text());
        };

        info!(
            provider = provider.display_name(),
            model = %request.model,
            source = %request.source,
            messages = request.messages.len(),
            "sending chat request"
        );

        match provider.complete(request).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(provider = provider.display_name(), error = %err, "chat request failed");
                ChatReply::error(err.reply_text())
            }
        }
    }

    /// Send a request on a background task.
    ///
    /// Returns a receiver that yields exactly one reply.
    pub fn send(&self, request: ChatRequest) -> oneshot::Receiver<ChatReply> {
        let (tx, rx) = oneshot::channel();
        let client = self.clone();

        tokio::spawn(async move {
            let reply = client.complete(&request).await;
            let _ = tx.send(reply);
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_for_model() {
        assert_eq!(Provider::for_model("claude-sonnet-4-5"), Provider::Anthropic);
        assert_eq!(Provider::for_model("Claude-Haiku"), Provider::Anthropic);
        assert_eq!(Provider::for_model("gpt-4o-mini"), Provider::OpenAi);
        assert_eq!(Provider::for_model("o4-mini-deep-research"), Provider::OpenAi);
    }

    #[test]
    fn test_deep_research_marker() {
        assert!(is_deep_research("o4-mini-deep-research"));
        assert!(is_deep_research("O3-DEEP-RESEARCH"));
        assert!(!is_deep_research("gpt-4o"));
    }

    #[test]
    fn test_client_routes_by_model() {
        let client = LlmClient::new(None);
        let openai = client.provider_for("gpt-4o").unwrap();
        assert_eq!(openai.provider(), Provider::OpenAi);
        let anthropic = client.provider_for("claude-sonnet-4-5").unwrap();
        assert_eq!(anthropic.provider(), Provider::Anthropic);
    }

    #[tokio::test]
    async fn test_missing_key_reply_text() {
        let openai: Arc<dyn LlmProvider> =
            Arc::new(OpenAiProvider::new(LlmConfig::for_provider(Provider::OpenAi)));
        let anthropic: Arc<dyn LlmProvider> =
            Arc::new(AnthropicClient::new(LlmConfig::for_provider(Provider::Anthropic)));
        let client = LlmClient::with_providers(vec![openai, anthropic]);

        let request = |model: &str| ChatRequest {
            messages: vec![ChatMessage::new("user", "Hi")],
            model: model.to_string(),
            source: "none".to_string(),
        };

        let reply = client.complete(&request("gpt-4o-mini")).await;
        assert_eq!(reply.into_content(), "Error: OPENAI_API_KEY not set");

        let reply = client.complete(&request("claude-sonnet-4-5")).await;
        assert_eq!(reply.into_content(), "Error: ANTHROPIC_API_KEY not set");
    }

    #[test]
    fn test_config_for_provider_defaults() {
        let config = LlmConfig::for_provider(Provider::Anthropic);
        assert_eq!(config.api_base, "https://api.anthropic.com/v1");
        assert!(!config.is_configured());
        assert!(config.web_search);
    }

    #[test]
    fn test_chat_message_from_message() {
        let message = Message::user("Hi".to_string());
        let chat: ChatMessage = (&message).into();
        assert_eq!(chat, ChatMessage::new("user", "Hi"));
    }
}

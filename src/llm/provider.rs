//! LLM Provider trait for the two chat backends.
//!
//! Every backend maps the same [`ChatRequest`] (conversation, model, data
//! source) onto its own API and returns a [`ChatReply`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{ChatRequest, Provider};
use crate::conversation::ChatReply;

/// Trait for LLM providers.
///
/// # Example
///
/// ```ignore
/// use eugene_chat::llm::{ChatMessage, ChatRequest, LlmProvider};
///
/// async fn ask(provider: &dyn LlmProvider) {
///     let request = ChatRequest {
///         messages: vec![ChatMessage::new("user", "Hello!")],
///         model: "gpt-4o-mini".to_string(),
///         source: "none".to_string(),
///     };
///     let reply = provider.complete(&request).await;
/// }
/// ```
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider type.
    fn provider(&self) -> Provider;

    /// Returns whether the provider has the credentials it needs.
    fn is_configured(&self) -> bool;

    /// Returns the display name for this provider instance.
    fn display_name(&self) -> &str {
        self.provider().display_name()
    }

    /// Returns whether this provider serves the given model.
    fn handles_model(&self, model: &str) -> bool {
        Provider::for_model(model) == self.provider()
    }

    /// Send the conversation and wait for the complete reply.
    async fn complete(&self, request: &ChatRequest) -> ProviderResult<ChatReply>;
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// Provider is not configured (missing API key, etc.)
    NotConfigured(String),

    /// Authentication failed
    AuthenticationFailed(String),

    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Network or connection error
    NetworkError(String),

    /// API returned an error
    ApiError {
        status: u16,
        message: String,
    },

    /// Invalid request (bad parameters, etc.)
    InvalidRequest(String),

    /// The response body could not be understood
    InvalidResponse(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, message: String, retry_after: Option<Duration>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::AuthenticationFailed(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited {
                message,
                retry_after,
            },
            _ => Self::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Text for the assistant's error turn.
    ///
    /// Errors raised before any request is made carry a message meant for
    /// the user as-is; everything else keeps its category prefix.
    pub fn reply_text(&self) -> String {
        match self {
            Self::NotConfigured(msg) | Self::InvalidRequest(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured(msg) => write!(f, "Provider not configured: {}", msg),
            Self::AuthenticationFailed(msg) => write!(f, "Authentication failed: {}", msg),
            Self::RateLimited { message, retry_after } => {
                if let Some(duration) = retry_after {
                    write!(f, "Rate limited: {} (retry after {:?})", message, duration)
                } else {
                    write!(f, "Rate limited: {}", message)
                }
            }
            Self::NetworkError(msg) => write!(f, "Network error: {}", msg),
            Self::ApiError { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkError("Request timed out".to_string())
        } else if err.is_connect() {
            Self::NetworkError(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::NetworkError(err.to_string())
        }
    }
}

/// Read the `retry-after` header, in seconds.
pub(crate) fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

//! The conversation store: an ordered, append-only list of messages.
//!
//! The store always starts with exactly one system message. It lives in
//! memory for the length of a session and is never persisted.

use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, ChatRequest};
use crate::message::{Message, Role};

/// Placeholder shown when a reply carries neither text nor an error.
pub const NO_RESPONSE: &str = "(no response)";

/// The payload of one completed request.
///
/// Mirrors the `{"text": ..., "web": ...}` / `{"error": ...}` shape of the
/// chat endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub web: bool,
}

impl ChatReply {
    /// A successful reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A failed reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// A reply with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Mark whether web search produced this reply.
    pub fn with_web(mut self, web: bool) -> Self {
        self.web = web;
        self
    }

    /// Returns true if the reply carries an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The assistant message content for this reply.
    pub fn into_content(self) -> String {
        if let Some(error) = self.error {
            return format!("Error: {}", error);
        }

        match self.text {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => NO_RESPONSE.to_string(),
        }
    }
}

/// Ordered, role-tagged chat history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with its system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt.into())],
        }
    }

    /// The system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    /// Append a user turn. `content` is what will be sent.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content.into()));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content.into()));
    }

    /// Append the assistant turn for a finished request.
    pub fn apply_reply(&mut self, reply: ChatReply) {
        self.push_assistant(reply.into_content());
    }

    /// Every message, system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages the user can see.
    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_hidden())
    }

    /// Number of messages the user can see.
    pub fn visible_len(&self) -> usize {
        self.visible().count()
    }

    /// The last message, if it is not the system prompt.
    pub fn last_visible(&self) -> Option<&Message> {
        self.messages.last().filter(|m| m.role != Role::System)
    }

    /// Wire form of the whole history.
    pub fn to_chat_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(ChatMessage::from).collect()
    }

    /// Build the request for the current history.
    pub fn request(&self, model: &str, source: &str) -> ChatRequest {
        ChatRequest {
            messages: self.to_chat_messages(),
            model: model.to_string(),
            source: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_single_hidden_system_message() {
        let conversation = Conversation::new("Be kind.");
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.visible_len(), 0);
        assert!(conversation.last_visible().is_none());
        assert_eq!(conversation.system_prompt(), "Be kind.");
    }

    #[test]
    fn test_reply_content_mapping() {
        assert_eq!(ChatReply::text("  hi \n").into_content(), "hi");
        assert_eq!(ChatReply::error("timeout").into_content(), "Error: timeout");
        assert_eq!(ChatReply::empty().into_content(), NO_RESPONSE);
        assert_eq!(ChatReply::text("   ").into_content(), NO_RESPONSE);
    }

    #[test]
    fn test_error_wins_over_text() {
        let reply = ChatReply {
            text: Some("partial".to_string()),
            error: Some("boom".to_string()),
            web: false,
        };
        assert_eq!(reply.into_content(), "Error: boom");
    }

    #[test]
    fn test_reply_payload_shapes() {
        let ok: ChatReply = serde_json::from_str(r#"{"text": "Hi", "web": true}"#).unwrap();
        assert_eq!(ok, ChatReply::text("Hi").with_web(true));

        let err: ChatReply = serde_json::from_str(r#"{"error": "messages[] required"}"#).unwrap();
        assert!(err.is_error());

        let empty: ChatReply = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.into_content(), NO_RESPONSE);
    }

    #[test]
    fn test_request_carries_full_history() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("q1");
        conversation.apply_reply(ChatReply::text("a1"));
        conversation.push_user("q2");

        let request = conversation.request("gpt-4o-mini", "gov");
        let roles: Vec<&str> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.source, "gov");
    }
}

use serde::{Deserialize, Serialize};

use crate::instructions::strip_instructions;
use crate::markdown;

/// Represents who sent a message in the chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Returns the wire name used by provider APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Returns the speaker label shown above a chat bubble.
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "You",
            Role::Assistant => "Eugene",
        }
    }
}

/// What a message looks like on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Display {
    /// Plain text, to be shown verbatim (escaped when written into HTML).
    Text(String),
    /// Rendered HTML from the markdown renderer.
    Html(String),
}

/// A single message in the chat history.
///
/// `content` is exactly what goes over the wire; what the user sees is
/// derived from it by [`Message::display`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new message with the given role and content.
    pub fn new(role: Role, content: String) -> Self {
        Self { role, content }
    }

    /// Create a new system message.
    pub fn system(content: String) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user message.
    pub fn user(content: String) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: String) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Returns true if the message is hidden from the user.
    pub fn is_hidden(&self) -> bool {
        self.role == Role::System
    }

    /// The content with any trailing instructions block removed.
    pub fn visible_text(&self) -> &str {
        strip_instructions(&self.content)
    }

    /// Display form: stripped text for users, rendered HTML for the assistant.
    pub fn display(&self) -> Display {
        let text = self.visible_text();
        match self.role {
            Role::Assistant => Display::Html(markdown::render(text)),
            Role::User | Role::System => Display::Text(text.to_string()),
        }
    }
}

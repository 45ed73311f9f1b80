//! Chat message values shared by the transcript, the store and providers.

use serde::{Deserialize, Serialize};

/// One entry in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub is_user: bool,
    /// Set while the typewriter is still revealing this message.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_typing: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            is_typing: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            is_typing: false,
        }
    }

    /// An assistant message whose text is still being revealed.
    pub fn typing(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            is_typing: true,
        }
    }

    pub fn role(&self) -> Role {
        if self.is_user {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

/// Speaker of a context message sent to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// `{role, content}` pair handed to reply providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: Role,
    pub content: String,
}

impl ContextMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for ContextMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role(), message.text.clone())
    }
}

//! Wire types shared by the gateway and the core: chat turns, the chat request body,
//! and the combined reply payload returned to the browser.

use serde::{Deserialize, Serialize};

/// Speaker of a single chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One immutable turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`. The client owns the conversation and re-sends it in full.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub conversation: Vec<ChatMessage>,
    #[serde(default)]
    pub persona: Option<String>,
    /// When present, image generation reuses the seed stored under this key.
    #[serde(default)]
    pub memory_key: Option<String>,
}

/// Combined text/image reply. `imageBase64` is always serialized (null when absent);
/// `error` only appears on the apology path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponsePayload {
    pub text: String,
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponsePayload {
    /// Generic apology returned when the whole request fails; the message goes in `error`.
    pub const APOLOGY: &'static str = "I apologize, but I encountered an error.";

    pub fn apology(error: impl Into<String>) -> Self {
        Self {
            text: Self::APOLOGY.to_string(),
            image_base64: None,
            error: Some(error.into()),
        }
    }
}

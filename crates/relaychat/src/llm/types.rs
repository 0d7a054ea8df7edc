//! Common types shared by the dispatcher and the provider adapters.

use serde::{Deserialize, Serialize};

/// One outbound call unit.
#[derive(Debug, Clone)]
pub struct LLMRequest {
    pub message: String,
    /// Provider id that bypasses selection.
    pub forced_provider: Option<String>,
}

impl LLMRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            forced_provider: None,
        }
    }

    /// Pin this request to a specific provider id.
    #[must_use]
    pub fn with_provider(mut self, id: impl Into<String>) -> Self {
        self.forced_provider = Some(id.into());
        self
    }
}

/// A normalized, non-empty completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LLMResult {
    pub content: String,
    #[serde(rename = "provider")]
    pub provider_name: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
}

/// A message in a chat-style request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Keep only non-empty extracted text.
pub(crate) fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

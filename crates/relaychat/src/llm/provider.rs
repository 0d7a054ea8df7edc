//! Provider descriptors and the transport capability.

use std::fmt;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::LLMError;
use super::types::LLMResult;
use super::{anthropic, gemini, openai};

/// Supported provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAI,
    Anthropic,
    Mistral,
}

/// Built-in settings for a provider family.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDefaults {
    pub display_name: &'static str,
    pub base_url: &'static str,
    pub model: &'static str,
    pub priority: i32,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub api_key_env: &'static str,
}

impl ProviderKind {
    /// All families, in default configuration order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Gemini,
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Mistral,
    ];

    /// Resolve a family from a descriptor id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == id)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Mistral => "mistral",
        }
    }

    pub fn defaults(&self) -> ProviderDefaults {
        match self {
            ProviderKind::Gemini => ProviderDefaults {
                display_name: "Google Gemini",
                base_url: "https://generativelanguage.googleapis.com/v1beta/models",
                model: "gemini-2.0-flash",
                priority: 1,
                max_retries: 3,
                retry_delay_ms: 1000,
                api_key_env: "GEMINI_API_KEY",
            },
            ProviderKind::OpenAI => ProviderDefaults {
                display_name: "OpenAI",
                base_url: "https://api.openai.com/v1",
                model: "gpt-3.5-turbo",
                priority: 2,
                max_retries: 3,
                retry_delay_ms: 1000,
                api_key_env: "OPENAI_API_KEY",
            },
            ProviderKind::Anthropic => ProviderDefaults {
                display_name: "Anthropic",
                base_url: "https://api.anthropic.com/v1",
                model: "claude-3-opus-20240229",
                priority: 3,
                max_retries: 2,
                retry_delay_ms: 1500,
                api_key_env: "ANTHROPIC_API_KEY",
            },
            ProviderKind::Mistral => ProviderDefaults {
                display_name: "Mistral",
                base_url: "https://api.mistral.ai/v1",
                model: "mistral-medium",
                priority: 4,
                max_retries: 3,
                retry_delay_ms: 1000,
                api_key_env: "MISTRAL_API_KEY",
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration record for one LLM backend. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub id: String,
    pub kind: ProviderKind,
    pub display_name: String,
    pub base_url: String,
    pub credential: String,
    pub model: String,
    /// Lower is more preferred.
    pub priority: i32,
    /// Attempts beyond the first.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub enabled: bool,
}

impl ProviderDescriptor {
    /// Descriptor for a family with its built-in settings.
    pub fn builtin(kind: ProviderKind, credential: impl Into<String>) -> Self {
        let d = kind.defaults();
        Self {
            id: kind.as_str().to_string(),
            kind,
            display_name: d.display_name.to_string(),
            base_url: d.base_url.to_string(),
            credential: credential.into(),
            model: d.model.to_string(),
            priority: d.priority,
            max_retries: d.max_retries,
            retry_delay_ms: d.retry_delay_ms,
            enabled: true,
        }
    }

    /// Enabled and carrying a credential.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.credential.is_empty()
    }

    /// Base URL without a trailing slash, for joining path suffixes.
    pub(crate) fn endpoint(&self, suffix: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), suffix)
    }
}

// The credential must never reach logs.
impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("display_name", &self.display_name)
            .field("base_url", &self.base_url)
            .field("credential", &"<redacted>")
            .field("model", &self.model)
            .field("priority", &self.priority)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Sends a single message to whichever family a descriptor names.
///
/// Adapters never retry; that is the dispatcher's job.
#[derive(Clone, Default)]
pub struct Transport {
    client: Client,
}

impl Transport {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn send(
        &self,
        message: &str,
        descriptor: &ProviderDescriptor,
    ) -> Result<LLMResult, LLMError> {
        match descriptor.kind {
            ProviderKind::Gemini => gemini::send(&self.client, descriptor, message).await,
            ProviderKind::OpenAI | ProviderKind::Mistral => {
                openai::send(&self.client, descriptor, message).await
            }
            ProviderKind::Anthropic => anthropic::send(&self.client, descriptor, message).await,
        }
    }
}

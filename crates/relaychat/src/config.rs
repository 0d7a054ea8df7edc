use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::llm::{ProviderDescriptor, ProviderKind, SelectionPolicy};

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub selection: SelectionPolicy,
    /// Provider list in configuration order. Built-in providers when absent.
    #[serde(default)]
    pub providers: Option<Vec<ProviderConfig>>,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Configured provider entries, or one entry per built-in family.
    pub fn provider_entries(&self) -> Vec<ProviderConfig> {
        match &self.providers {
            Some(providers) => providers.clone(),
            None => ProviderKind::ALL
                .iter()
                .map(|kind| ProviderConfig::new(kind.as_str()))
                .collect(),
        }
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    300
}

// ============================================================================
// HttpConfig
// ============================================================================

/// Outbound HTTP client settings.
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
        }
    }
}

fn default_http_timeout() -> u64 {
    60
}

// ============================================================================
// ProviderConfig
// ============================================================================

/// One provider entry. Unset fields fall back to the family's built-ins.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    /// Adapter family; derived from `id` when omitted.
    #[serde(default)]
    pub kind: Option<ProviderKind>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_delay_ms: Option<u64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Environment variable holding the credential.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            display_name: None,
            base_url: None,
            model: None,
            priority: None,
            max_retries: None,
            retry_delay_ms: None,
            enabled: default_enabled(),
            api_key_env: None,
        }
    }

    /// Environment variable consulted for this provider's credential.
    pub fn credential_env(&self) -> Result<String, ConfigError> {
        let kind = self.resolve_kind()?;
        Ok(self
            .api_key_env
            .clone()
            .unwrap_or_else(|| kind.defaults().api_key_env.to_string()))
    }

    /// Build the immutable descriptor, reading the credential via `lookup`.
    pub fn resolve(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderDescriptor, ConfigError> {
        let kind = self.resolve_kind()?;
        let defaults = kind.defaults();

        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| defaults.base_url.to_string());
        Url::parse(&base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            id: self.id.clone(),
            source,
        })?;

        let credential = lookup(&self.credential_env()?)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        Ok(ProviderDescriptor {
            id: self.id.clone(),
            kind,
            display_name: self
                .display_name
                .clone()
                .unwrap_or_else(|| defaults.display_name.to_string()),
            base_url,
            credential,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| defaults.model.to_string()),
            priority: self.priority.unwrap_or(defaults.priority),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
            enabled: self.enabled,
        })
    }

    fn resolve_kind(&self) -> Result<ProviderKind, ConfigError> {
        self.kind
            .or_else(|| ProviderKind::from_id(&self.id))
            .ok_or_else(|| ConfigError::UnknownProvider(self.id.clone()))
    }
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("duplicate provider id: {0}")]
    DuplicateProvider(String),

    #[error("unknown provider '{0}': set `kind` to one of gemini, openai, anthropic, mistral")]
    UnknownProvider(String),

    #[error("invalid base_url for provider '{id}': {source}")]
    InvalidBaseUrl {
        id: String,
        #[source]
        source: url::ParseError,
    },
}

// ============================================================================
// Tests
// ============================================================================

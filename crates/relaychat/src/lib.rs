//! Relaychat - forwards chat messages to LLM providers with retry and failover.

pub mod config;
pub mod handlers;
pub mod llm;
pub mod response;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use config::{Config, ConfigError};
use llm::{Dispatcher, ProviderRegistry, Transport};

/// Build a dispatcher from configuration, reading credentials from the
/// environment.
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher, BuildError> {
    let registry = ProviderRegistry::from_env(config)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_seconds))
        .build()?;
    Ok(Dispatcher::new(Arc::new(registry), Transport::new(client)).with_policy(config.selection))
}

/// Errors raised while wiring the dispatcher at startup.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

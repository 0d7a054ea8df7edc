//! Provider registry built once from configuration.

use std::collections::HashSet;

use tracing::{info, warn};

use super::provider::{ProviderDescriptor, ProviderKind};
use crate::config::{Config, ConfigError};

/// Ordered, immutable list of provider descriptors.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Build a registry from descriptors in configuration order.
    ///
    /// Ids are expected to be unique; `find_by_id` returns the first match.
    pub fn new(providers: Vec<ProviderDescriptor>) -> Self {
        Self { providers }
    }

    /// Build from configuration, reading credentials from the environment.
    pub fn from_env(config: &Config) -> Result<Self, ConfigError> {
        Self::from_config(config, |name| std::env::var(name).ok())
    }

    /// Build from configuration, resolving credentials through `lookup`.
    ///
    /// A missing credential deactivates that provider; it is never an error.
    pub fn from_config(
        config: &Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut providers = Vec::new();

        for entry in config.provider_entries() {
            let descriptor = entry.resolve(&lookup)?;
            if !seen.insert(descriptor.id.clone()) {
                return Err(ConfigError::DuplicateProvider(descriptor.id));
            }

            if descriptor.is_active() {
                info!(
                    provider = %descriptor.id,
                    model = %descriptor.model,
                    "Registered {} provider",
                    descriptor.display_name
                );
            } else if descriptor.enabled {
                info!(provider = %descriptor.id, "No credential set, provider inactive");
            }
            providers.push(descriptor);
        }

        let registry = Self::new(providers);
        if registry.active_providers().is_empty() {
            let vars: Vec<&str> = ProviderKind::ALL
                .iter()
                .map(|k| k.defaults().api_key_env)
                .collect();
            warn!(
                "No LLM providers configured. Set one of {}.",
                vars.join(", ")
            );
        }

        Ok(registry)
    }

    /// All descriptors, as configured.
    pub fn all(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Enabled descriptors with a credential, in configuration order.
    pub fn active_providers(&self) -> Vec<&ProviderDescriptor> {
        self.providers.iter().filter(|p| p.is_active()).collect()
    }

    /// Look up a descriptor by id.
    pub fn find_by_id(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }
}

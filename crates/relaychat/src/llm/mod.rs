//! LLM dispatch core: provider registry, selection, transport, and failover.

mod anthropic;
mod dispatcher;
mod error;
mod gemini;
mod openai;
mod provider;
mod registry;
mod selector;
mod types;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, LLMError};
pub use provider::{ProviderDefaults, ProviderDescriptor, ProviderKind, Transport};
pub use registry::ProviderRegistry;
pub use selector::{ProviderSelector, SelectionPolicy};
pub use types::{LLMRequest, LLMResult, Message, Role};

//! Dispatch orchestration: selection, per-provider retry, and failover.
//!
//! One dispatch walks `SELECTING → CALLING → (SUCCESS | RETRYING |
//! FAILING_OVER) → DONE | ERROR`. Attempts are sequential; providers are
//! never raced. Each provider is tried at most once per dispatch, so the loop
//! is bounded by the sum of the active providers' retry budgets.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use super::error::{DispatchError, LLMError};
use super::provider::{ProviderDescriptor, Transport};
use super::registry::ProviderRegistry;
use super::selector::{ProviderSelector, SelectionPolicy};
use super::types::{LLMRequest, LLMResult};

/// Routes messages to providers with retry and failover.
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    selector: ProviderSelector,
    transport: Transport,
    policy: SelectionPolicy,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, transport: Transport) -> Self {
        Self {
            registry,
            selector: ProviderSelector::new(),
            transport,
            policy: SelectionPolicy::default(),
        }
    }

    /// Set the policy used for the first pick of each dispatch.
    #[must_use]
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Dispatch a request with no external cancellation.
    ///
    /// Dropping the returned future still aborts any pending wait or
    /// in-flight HTTP call.
    pub async fn dispatch(&self, request: LLMRequest) -> Result<LLMResult, DispatchError> {
        self.dispatch_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Dispatch a request, giving up with `Cancelled` once `cancel` fires.
    pub async fn dispatch_with_cancel(
        &self,
        request: LLMRequest,
        cancel: &CancellationToken,
    ) -> Result<LLMResult, DispatchError> {
        let span = info_span!("dispatch", request_id = %generate_request_id());
        self.run(request, cancel).instrument(span).await
    }

    async fn run(
        &self,
        request: LLMRequest,
        cancel: &CancellationToken,
    ) -> Result<LLMResult, DispatchError> {
        if request.message.trim().is_empty() {
            return Err(DispatchError::EmptyMessage);
        }

        let active = self.registry.active_providers();

        // SELECTING
        let selected = match request.forced_provider.as_deref() {
            Some(id) => active.iter().copied().find(|p| p.id == id),
            None => self.selector.pick(self.policy, &active),
        };
        let Some(mut current) = selected else {
            warn!(
                forced = ?request.forced_provider,
                active = active.len(),
                "No active LLM provider available"
            );
            return Err(DispatchError::NoProviderAvailable);
        };

        let mut tried: Vec<String> = Vec::new();
        let mut attempts: u32 = 0;
        let mut first_error: Option<String> = None;

        loop {
            let mut attempt: u32 = 0;

            // CALLING / RETRYING
            let last_error = loop {
                attempt += 1;
                attempts += 1;

                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        info!(provider = %current.id, attempt, "Dispatch cancelled during call");
                        return Err(DispatchError::Cancelled);
                    }
                    outcome = self.transport.send(&request.message, current) => outcome,
                };

                match outcome {
                    Ok(result) => {
                        info!(
                            provider = %current.id,
                            attempt,
                            outcome = "success",
                            tokens = ?result.token_count,
                            "LLM attempt succeeded"
                        );
                        return Ok(result);
                    }
                    Err(e) => {
                        warn!(
                            provider = %current.id,
                            attempt,
                            max_attempts = current.max_retries + 1,
                            outcome = "failure",
                            error = %e,
                            "LLM attempt failed"
                        );
                        first_error.get_or_insert_with(|| e.to_string());

                        if attempt > current.max_retries {
                            break e;
                        }
                        if !backoff(current, cancel).await {
                            info!(provider = %current.id, attempt, "Dispatch cancelled during backoff");
                            return Err(DispatchError::Cancelled);
                        }
                    }
                }
            };

            // FAILING_OVER
            tried.push(current.id.clone());
            match self.failover_target(&active, &tried) {
                Some(next) => {
                    info!(
                        from = %current.id,
                        to = %next.id,
                        "All retries failed, trying next provider"
                    );
                    current = next;
                }
                None => {
                    warn!(tried = ?tried, attempts, "All LLM providers exhausted");
                    return Err(exhausted(tried, attempts, first_error, last_error));
                }
            }
        }
    }

    /// Next provider in rotation not yet tried in this dispatch.
    ///
    /// Gives up after one lap of the active list.
    fn failover_target<'a>(
        &self,
        active: &[&'a ProviderDescriptor],
        tried: &[String],
    ) -> Option<&'a ProviderDescriptor> {
        self.selector.next_matching(active, |candidate| {
            let fresh = !tried.contains(&candidate.id);
            if !fresh {
                debug!(provider = %candidate.id, "Skipping provider already tried");
            }
            fresh
        })
    }
}

/// Wait the provider's retry delay. Returns false if cancelled first.
async fn backoff(descriptor: &ProviderDescriptor, cancel: &CancellationToken) -> bool {
    let delay = Duration::from_millis(descriptor.retry_delay_ms);
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn exhausted(
    tried: Vec<String>,
    attempts: u32,
    first_error: Option<String>,
    last_error: LLMError,
) -> DispatchError {
    DispatchError::Exhausted {
        first_error: first_error.unwrap_or_else(|| last_error.to_string()),
        tried,
        attempts,
        last_error,
    }
}

fn generate_request_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

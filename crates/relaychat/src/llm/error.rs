//! LLM error types.

use thiserror::Error;

/// Errors that can occur when calling a single provider.
///
/// Every variant is retryable from the dispatcher's point of view.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed (connect, timeout, undecodable body)
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Call succeeded but no text could be extracted
    #[error("no content in {provider} response")]
    EmptyResponse { provider: String },

    /// Configured base URL does not form a valid endpoint
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl LLMError {
    /// Build an `Api` error from a failed response, keeping the provider's
    /// error payload as compact JSON when it parses, the raw body otherwise.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) => value.to_string(),
            Err(_) => body,
        };
        LLMError::Api { status, message }
    }
}

/// Terminal outcome of a dispatch that produced no content.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request carried no text.
    #[error("message is empty")]
    EmptyMessage,

    /// No active provider exists (or the forced one is not active).
    #[error("no active LLM provider available")]
    NoProviderAvailable,

    /// Every provider tried exhausted its retry budget.
    #[error(
        "all providers exhausted after {attempts} attempt(s) across [{}]: {last_error}",
        .tried.join(", ")
    )]
    Exhausted {
        tried: Vec<String>,
        attempts: u32,
        first_error: String,
        #[source]
        last_error: LLMError,
    },

    /// The caller abandoned the request.
    #[error("dispatch cancelled")]
    Cancelled,
}

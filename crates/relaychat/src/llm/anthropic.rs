//! Anthropic messages adapter with native API format.

use reqwest::Client;

use super::error::LLMError;
use super::provider::ProviderDescriptor;
use super::types::{LLMResult, Message, non_empty};

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub(super) async fn send(
    client: &Client,
    descriptor: &ProviderDescriptor,
    message: &str,
) -> Result<LLMResult, LLMError> {
    let url = descriptor.endpoint("messages");

    let request = Request {
        model: &descriptor.model,
        max_tokens: MAX_TOKENS,
        messages: vec![Message::user(message)],
    };

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("x-api-key", &descriptor.credential)
        .header("anthropic-version", API_VERSION)
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(LLMError::from_response(response).await);
    }

    let response: Response = response.json().await?;
    from_response(response, descriptor)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(serde::Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(serde::Deserialize)]
struct Response {
    #[serde(default)]
    content: Vec<Content>,
    usage: Option<ResponseUsage>,
}

#[derive(serde::Deserialize)]
struct Content {
    text: Option<String>,
}

#[derive(serde::Deserialize)]
struct ResponseUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

// ============================================================================
// Conversions
// ============================================================================

fn from_response(
    response: Response,
    descriptor: &ProviderDescriptor,
) -> Result<LLMResult, LLMError> {
    let text = response.content.into_iter().next().and_then(|c| c.text);

    let Some(content) = non_empty(text) else {
        return Err(LLMError::EmptyResponse {
            provider: descriptor.display_name.clone(),
        });
    };

    Ok(LLMResult {
        content,
        provider_name: descriptor.display_name.clone(),
        model: descriptor.model.clone(),
        token_count: response
            .usage
            .map(|u| u.input_tokens.saturating_add(u.output_tokens)),
    })
}

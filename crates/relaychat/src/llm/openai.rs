//! OpenAI-compatible chat completions adapter.
//!
//! Serves both OpenAI and Mistral, which share the same wire format.

use reqwest::Client;

use super::error::LLMError;
use super::provider::ProviderDescriptor;
use super::types::{LLMResult, Message, non_empty};

const TEMPERATURE: f32 = 0.7;

pub(super) async fn send(
    client: &Client,
    descriptor: &ProviderDescriptor,
    message: &str,
) -> Result<LLMResult, LLMError> {
    let url = descriptor.endpoint("chat/completions");

    let request = Request {
        model: &descriptor.model,
        messages: vec![Message::user(message)],
        temperature: TEMPERATURE,
    };

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", descriptor.credential))
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
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(serde::Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(serde::Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(serde::Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

fn from_response(
    response: Response,
    descriptor: &ProviderDescriptor,
) -> Result<LLMResult, LLMError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content);

    let Some(content) = non_empty(text) else {
        return Err(LLMError::EmptyResponse {
            provider: descriptor.display_name.clone(),
        });
    };

    Ok(LLMResult {
        content,
        provider_name: descriptor.display_name.clone(),
        model: descriptor.model.clone(),
        token_count: response.usage.and_then(|u| u.total_tokens),
    })
}

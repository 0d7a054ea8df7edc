//! Google Gemini `generateContent` adapter.
//!
//! The API key travels as a `key` query parameter; usage is not reported.

use reqwest::Client;
use url::Url;

use super::error::LLMError;
use super::provider::ProviderDescriptor;
use super::types::{LLMResult, non_empty};

pub(super) async fn send(
    client: &Client,
    descriptor: &ProviderDescriptor,
    message: &str,
) -> Result<LLMResult, LLMError> {
    let mut url = Url::parse(&descriptor.endpoint(&format!(
        "{}:generateContent",
        descriptor.model
    )))?;
    url.query_pairs_mut()
        .append_pair("key", &descriptor.credential);

    let request = Request {
        contents: vec![RequestContent {
            parts: vec![RequestPart { text: message }],
        }],
    };

    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(LLMError::from_response(response).await);
    }

    let response: Response = response.json().await?;
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text);

    let Some(content) = non_empty(text) else {
        return Err(LLMError::EmptyResponse {
            provider: descriptor.display_name.clone(),
        });
    };

    Ok(LLMResult {
        content,
        provider_name: descriptor.display_name.clone(),
        model: descriptor.model.clone(),
        token_count: None,
    })
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(serde::Serialize)]
struct Request<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(serde::Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(serde::Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(serde::Deserialize)]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(serde::Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

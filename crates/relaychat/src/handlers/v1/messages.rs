//! Message dispatch HTTP handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::error;

use crate::llm::{DispatchError, LLMRequest};
use crate::response::{self, NO_RESPONSE_MESSAGE};
use crate::server::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SendMessageRequest {
    message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/messages
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    if req.message.trim().is_empty() {
        return response::bad_request("message must not be empty").into_response();
    }

    match state.dispatcher.dispatch(LLMRequest::new(req.message)).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            error!(error = %e, "LLM dispatch failed");
            error_response(e)
        }
    }
}

fn error_response(error: DispatchError) -> Response {
    match error {
        DispatchError::EmptyMessage => {
            response::bad_request("message must not be empty").into_response()
        }
        DispatchError::NoProviderAvailable => {
            response::service_unavailable(NO_RESPONSE_MESSAGE).into_response()
        }
        DispatchError::Cancelled => response::cancelled(NO_RESPONSE_MESSAGE).into_response(),
        DispatchError::Exhausted { .. } => {
            response::bad_gateway(NO_RESPONSE_MESSAGE).into_response()
        }
    }
}

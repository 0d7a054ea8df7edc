//! Provider listing HTTP handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::llm::{ProviderDescriptor, ProviderKind};
use crate::server::AppState;

#[derive(Serialize)]
pub struct ProviderSummary {
    id: String,
    kind: ProviderKind,
    name: String,
    model: String,
    priority: i32,
    active: bool,
}

impl From<&ProviderDescriptor> for ProviderSummary {
    fn from(d: &ProviderDescriptor) -> Self {
        Self {
            id: d.id.clone(),
            kind: d.kind,
            name: d.display_name.clone(),
            model: d.model.clone(),
            priority: d.priority,
            active: d.is_active(),
        }
    }
}

#[derive(Serialize)]
pub struct ListProvidersResponse {
    providers: Vec<ProviderSummary>,
}

/// GET /api/v1/providers
pub async fn list_providers(State(state): State<AppState>) -> Json<ListProvidersResponse> {
    let providers = state
        .dispatcher
        .registry()
        .all()
        .iter()
        .map(ProviderSummary::from)
        .collect();
    Json(ListProvidersResponse { providers })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::llm::{Dispatcher, ProviderRegistry, Transport};
    use crate::server::{AppState, build_app};

    use super::*;

    #[tokio::test]
    async fn lists_providers_without_credentials() {
        let registry = Arc::new(ProviderRegistry::new(vec![
            ProviderDescriptor::builtin(ProviderKind::Gemini, "g-secret"),
            ProviderDescriptor::builtin(ProviderKind::OpenAI, ""),
        ]));
        let dispatcher = Arc::new(Dispatcher::new(registry, Transport::default()));
        let app = build_app(AppState { dispatcher }, 30);

        let response = app
            .oneshot(Request::get("/api/v1/providers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("g-secret"));

        let body: Value = serde_json::from_str(&text).unwrap();
        let providers = body["providers"].as_array().unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0]["id"], "gemini");
        assert_eq!(providers[0]["name"], "Google Gemini");
        assert_eq!(providers[0]["active"], true);
        assert_eq!(providers[1]["kind"], "openai");
        assert_eq!(providers[1]["active"], false);
    }
}

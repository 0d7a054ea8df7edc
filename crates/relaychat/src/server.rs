use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;

use crate::handlers;
use crate::llm::Dispatcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the router. The timeout layer drops the handler future, which
/// aborts any pending back-off and in-flight upstream call.
pub fn build_app(state: AppState, request_timeout_secs: u64) -> Router {
    let api_v1 = Router::new()
        .route("/messages", post(handlers::v1::send_message))
        .route("/providers", get(handlers::v1::list_providers))
        .with_state(state.clone());

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .with_state(state)
        .nest("/api/v1", api_v1)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::llm::{ProviderDescriptor, ProviderKind, ProviderRegistry, Transport};

    fn app(providers: Vec<ProviderDescriptor>) -> Router {
        let registry = Arc::new(ProviderRegistry::new(providers));
        let dispatcher = Arc::new(Dispatcher::new(registry, Transport::default()));
        build_app(AppState { dispatcher }, 30)
    }

    async fn status_of(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn livez_is_always_ok() {
        assert_eq!(status_of(app(Vec::new()), "/livez").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readyz_requires_an_active_provider() {
        assert_eq!(
            status_of(app(Vec::new()), "/readyz").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        let ready = app(vec![ProviderDescriptor::builtin(ProviderKind::Gemini, "key")]);
        assert_eq!(status_of(ready, "/readyz").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        assert_eq!(
            status_of(app(Vec::new()), "/api/v1/sessions").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn slow_upstream_hits_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": [{"message": {"content": "late"}}]}))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let mut openai = ProviderDescriptor::builtin(ProviderKind::OpenAI, "key");
        openai.base_url = server.uri();
        let registry = Arc::new(ProviderRegistry::new(vec![openai]));
        let dispatcher = Arc::new(Dispatcher::new(registry, Transport::default()));
        let app = build_app(AppState { dispatcher }, 1);

        let request = Request::post("/api/v1/messages")
            .header("content-type", "application/json")
            .body(Body::from(json!({"message": "hi"}).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}

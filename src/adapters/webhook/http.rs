//! Webhook HTTP server.
//!
//! Receives Deskfy webhooks on the configured path and exposes a health
//! endpoint with the relay counters. Every request runs in its own span
//! carrying a generated request id. A webhook that outlives the request
//! timeout is answered `200 {"ok": true}` while its processing finishes in
//! the background.

use std::any::Any;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, Response, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::models::{decode_body, ServerConfig};
use crate::services::relay::{RelayOutcome, RelayService, StatsSnapshot};

/// Header carrying the shared secret.
pub const TOKEN_HEADER: &str = "x-relay-token";

/// Configuration for the webhook server.
#[derive(Debug, Clone)]
pub struct WebhookHttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path receiving webhooks.
    pub webhook_path: String,
    /// Secret callers must present, if any.
    pub shared_secret: Option<String>,
    /// How long a caller waits for processing before being answered.
    /// Processing itself always runs to completion.
    pub request_timeout: Duration,
}

impl Default for WebhookHttpConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for WebhookHttpConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            webhook_path: config.webhook_path.clone(),
            shared_secret: config
                .shared_secret
                .clone()
                .filter(|s| !s.is_empty()),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Shared state for the webhook server.
pub struct WebhookState {
    /// Pipeline every accepted webhook goes through.
    pub relay: Arc<RelayService>,
    /// Server settings.
    pub config: WebhookHttpConfig,
    /// Reported by `/health`.
    pub started_at: DateTime<Utc>,
}

/// Webhook HTTP server.
pub struct WebhookHttpServer {
    state: Arc<WebhookState>,
}

impl WebhookHttpServer {
    /// Create a server around `relay`.
    pub fn new(relay: Arc<RelayService>, config: WebhookHttpConfig) -> Self {
        Self {
            state: Arc::new(WebhookState {
                relay,
                config,
                started_at: Utc::now(),
            }),
        }
    }

    /// Build the router with all endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.state.config.webhook_path, post(handle_webhook))
            .route("/health", get(health_check))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(handle_panic))
    }

    /// Start the server and run until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.state.config.host, self.state.config.port)
            .parse()
            .context("Invalid server address")?;
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!(
            %addr,
            webhook_path = %self.state.config.webhook_path,
            "webhook server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Webhook server failed")?;
        Ok(())
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    started_at: String,
    stats: StatsSnapshot,
}

fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    (status, Json(json!({ "error": message }))).into_response()
}

fn is_authorized(
    config: &WebhookHttpConfig,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> bool {
    let Some(secret) = config.shared_secret.as_deref() else {
        return true;
    };
    let from_header = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    let from_query = query.get("token").map(String::as_str);
    from_header == Some(secret) || from_query == Some(secret)
}

/// Receive one webhook.
async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response<Body> {
    let span = tracing::info_span!("webhook", request_id = %Uuid::new_v4());

    async move {
        if !is_authorized(&state.config, &headers, &query) {
            tracing::warn!("rejected webhook without a valid token");
            return error_response(StatusCode::UNAUTHORIZED, "unauthorized");
        }

        let payload = decode_body(&body);
        // Never cancelled: a posted card must always get its locator stored.
        let relay = state.relay.clone();
        let mut processing = tokio::spawn(
            async move { relay.process(&payload).await }.instrument(tracing::Span::current()),
        );

        match tokio::time::timeout(state.config.request_timeout, &mut processing).await {
            Ok(Ok(RelayOutcome::Ignored(reason))) => Json(json!({
                "ok": true,
                "ignored": reason.code(),
                "reason": reason.description(),
            }))
            .into_response(),
            Ok(Ok(RelayOutcome::Delivered { .. })) => Json(json!({ "ok": true })).into_response(),
            Ok(Err(err)) => {
                tracing::error!(error = %err, "webhook processing task failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "processing failed")
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = state.config.request_timeout.as_secs(),
                    "webhook still processing at the deadline, answering now and finishing in the background"
                );
                Json(json!({ "ok": true })).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<WebhookState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at.to_rfc3339(),
        stats: state.relay.stats(),
    })
}

/// Turn a handler panic into a JSON 500.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "webhook handler panicked");

    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "error": detail }).to_string()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secured() -> WebhookHttpConfig {
        WebhookHttpConfig {
            shared_secret: Some("s3cret".to_string()),
            ..WebhookHttpConfig::default()
        }
    }

    #[test]
    fn test_config_from_server_config() {
        let config = WebhookHttpConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.webhook_path, "/deskfy");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.shared_secret.is_none());

        let empty_secret = ServerConfig {
            shared_secret: Some(String::new()),
            ..ServerConfig::default()
        };
        assert!(WebhookHttpConfig::from(&empty_secret).shared_secret.is_none());
    }

    #[test]
    fn test_authorization_sources() {
        let config = secured();
        let mut headers = HeaderMap::new();
        let mut query = HashMap::new();
        assert!(!is_authorized(&config, &headers, &query));

        headers.insert(TOKEN_HEADER, "s3cret".parse().unwrap());
        assert!(is_authorized(&config, &headers, &query));

        headers.insert(TOKEN_HEADER, "wrong".parse().unwrap());
        assert!(!is_authorized(&config, &headers, &query));

        query.insert("token".to_string(), "s3cret".to_string());
        assert!(is_authorized(&config, &headers, &query));

        assert!(is_authorized(&WebhookHttpConfig::default(), &HeaderMap::new(), &HashMap::new()));
    }

    #[test]
    fn test_handle_panic_is_json_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}

//! HTTP server implementation using Axum.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use sabia_core::config::GatewayConfig;
use sabia_scheduler::MessageQueue;
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared state for the gateway server.
pub struct AppState {
    pub queue: Arc<MessageQueue>,
    pub start_time: Instant,
    /// Expected webhook secret header, if configured.
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(queue: Arc<MessageQueue>, webhook_secret: Option<String>) -> Self {
        Self {
            queue,
            start_time: Instant::now(),
            webhook_secret,
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health_check))
        .route("/webhook", post(routes::webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn start<F>(config: &GatewayConfig, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway listening on http://{}", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    tracing::info!("🌐 Gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::SECRET_HEADER;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app(capacity: Option<usize>, secret: Option<&str>) -> (Router, Arc<MessageQueue>) {
        let queue = MessageQueue::new(capacity);
        let state = Arc::new(AppState::new(queue.clone(), secret.map(String::from)));
        (build_router(state), queue)
    }

    fn update(chat_id: i64, text: &str) -> String {
        serde_json::json!({
            "update_id": 1,
            "message": {"message_id": 2, "chat": {"id": chat_id}, "text": text}
        })
        .to_string()
    }

    fn post_webhook(body: String) -> Request<Body> {
        Request::post("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index() {
        let (app, _) = app(None, None);
        let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "everything is awesome");
    }

    #[tokio::test]
    async fn test_webhook_enqueues() {
        let (app, queue) = app(None, None);
        let response = app.oneshot(post_webhook(update(42, "What is AI?"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
        let ticket = queue.dequeue().await.unwrap();
        assert_eq!(ticket.message().chat_id, 42);
        assert_eq!(ticket.message().text, "What is AI?");
        ticket.complete();
    }

    #[tokio::test]
    async fn test_malformed_update_is_acknowledged() {
        let (app, queue) = app(None, None);
        let response = app.clone().oneshot(post_webhook("not json".into())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.oneshot(post_webhook(r#"{"update_id": 3}"#.into())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_secret_is_enforced() {
        let (app, queue) = app(None, Some("s3cret"));
        let response = app.clone().oneshot(post_webhook(update(1, "hi"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::post("/webhook")
            .header(SECRET_HEADER, "s3cret")
            .body(Body::from(update(1, "hi")))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_returns_503() {
        let (app, queue) = app(Some(1), None);
        let first = app.clone().oneshot(post_webhook(update(1, "one"))).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let second = app.oneshot(post_webhook(update(1, "two"))).await.unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(queue.stats().rejected, 1);
    }

    #[tokio::test]
    async fn test_health_reports_queue() {
        let (app, queue) = app(None, None);
        queue.enqueue(5, "pending").unwrap();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["queue"]["queued"], 1);
        assert_eq!(json["queue"]["total_enqueued"], 1);
    }
}

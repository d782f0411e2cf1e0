//! Axum server setup and router configuration.

use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{Json, Router, extract::State, routing::get};
use melotech_sdk::objects::HealthResponse;
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Service name reported by `/` and `/health`.
pub const SERVICE_NAME: &str = "MeloTech Backend";

/// Feature flags reported by `/health`.
pub const FEATURES: [&str; 3] = ["mailgun", "supabase_webhooks", "websockets"];

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(crate::api::router())
        .with_state(state)
}

/// Root response.
#[derive(Serialize)]
struct RootResponse {
    service: &'static str,
    version: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health check with the live state of the connection registry.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let active_connections = state.registry.connection_count(None).await;
    let active_rooms = state
        .registry
        .list_rooms()
        .await
        .into_iter()
        .map(String::from)
        .collect();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: FEATURES.iter().map(|f| f.to_string()).collect(),
        active_connections,
        active_rooms,
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state as state;
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderValue, Request, StatusCode};
    use melotech_core::registry::{ChannelSubscriber, Room};
    use melotech_sdk::objects::{WebhookAck, WsServerMessage};
    use melotech_sdk::signature::{SIGNATURE_HEADER, sign_body};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn post(uri: &str, body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const ACCEPTED: &str = r#"{"table":"submissions","old_record":{"status":"pending"},"new_record":{"status":"accepted","userid":"u1","title":"Night Drive"}}"#;

    #[tokio::test]
    async fn test_health_reflects_registry() {
        let (state, _) = state(None);
        let (a, _rx_a) = ChannelSubscriber::channel(4, Duration::from_secs(1));
        let (b, _rx_b) = ChannelSubscriber::channel(4, Duration::from_secs(1));
        state.registry.register(Arc::new(a), Room::admin(), None).await;
        state
            .registry
            .register(Arc::new(b), Room::artist("42"), Some("42".into()))
            .await;

        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        health.active_rooms.sort();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.active_connections, 2);
        assert_eq!(health.active_rooms, vec!["admin", "artist:42"]);
        assert_eq!(health.features, FEATURES);
    }

    #[tokio::test]
    async fn test_root() {
        let (state, _) = state(None);
        let response = build_router(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json(response).await;
        assert_eq!(body["service"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn test_status_update_sends_email() {
        let (state, outbox) = state(None);
        let response = build_router(state)
            .oneshot(post("/webhook/submission-status-update", ACCEPTED, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["message"], "Email notification sent successfully");
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["user_email"], "artist@example.com");
        assert_eq!(body["submission_title"], "Night Drive");
        assert_eq!(outbox.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_signature_is_401() {
        let (state, outbox) = state(Some("secret"));
        let response = build_router(state)
            .oneshot(post(
                "/webhook/submission-status-update",
                ACCEPTED,
                Some("0000"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["detail"], "Invalid webhook signature");
        assert!(outbox.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_text_signature_is_401() {
        for uri in ["/webhook/submission-status-update", "/webhook/submission-update"] {
            let (state, outbox) = state(Some("secret"));
            let (sink, mut rx) = ChannelSubscriber::channel(4, Duration::from_secs(1));
            state.registry.register(Arc::new(sink), Room::admin(), None).await;

            let mut request = post(uri, ACCEPTED, None);
            request.headers_mut().insert(
                SIGNATURE_HEADER,
                HeaderValue::from_bytes(b"\xffbad").unwrap(),
            );
            let response = build_router(state).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(json(response).await["detail"], "Invalid webhook signature");
            assert!(outbox.0.lock().unwrap().is_empty());

            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_good_signature_is_accepted() {
        let (state, _) = state(Some("secret"));
        let signature = sign_body(ACCEPTED.as_bytes(), b"secret");
        let response = build_router(state)
            .oneshot(post(
                "/webhook/submission-status-update",
                ACCEPTED,
                Some(&signature),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let (state, _) = state(None);
        let response = build_router(state)
            .oneshot(post("/webhook/submission-update", "{oops", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["detail"], "Invalid JSON payload");
    }

    #[tokio::test]
    async fn test_unsupported_table_is_200() {
        let (state, _) = state(None);
        let response = build_router(state)
            .oneshot(post(
                "/webhook/submission-status-update",
                r#"{"table":"profiles","record":{}}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let ack: WebhookAck = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ack.message, "Unsupported table: profiles");
    }

    #[tokio::test]
    async fn test_unsupported_table_with_odd_envelope_is_200() {
        let (state, _) = state(None);
        let response = build_router(state)
            .oneshot(post(
                "/webhook/submission-update",
                r#"{"table":7,"record":"not a row"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let ack: WebhookAck = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ack.message, "Unsupported table for real-time updates: 7");
    }

    #[tokio::test]
    async fn test_realtime_update_reaches_admin_room() {
        let (state, _) = state(None);
        let (admin, mut rx) = ChannelSubscriber::channel(4, Duration::from_secs(1));
        state.registry.register(Arc::new(admin), Room::admin(), None).await;

        let response = build_router(state)
            .oneshot(post("/webhook/submission-update", ACCEPTED, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["message"], "Real-time submission update processed");
        assert_eq!(body["updated_fields"], serde_json::json!(["status"]));
        assert_eq!(body["broadcast"], true);

        let text = rx.recv().await.unwrap();
        let WsServerMessage::SubmissionUpdate { data, .. } = serde_json::from_str::<WsServerMessage>(&text).unwrap();
        assert_eq!(data.title, "Night Drive");
    }
}

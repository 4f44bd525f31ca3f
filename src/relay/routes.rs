//! HTTP route handlers for the relay API.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::composer;
use crate::error::ChatError;
use crate::provider::{ProviderEvent, ProviderEventStream};
use crate::sse::{StreamEvent, encode_event};
use crate::wire::{ChatRequest, ErrorBody};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_completion))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "murmur-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handle one chat turn: compose, open the upstream stream, re-encode.
///
/// Upstream failures before a stream exists produce a JSON error response;
/// once streaming has started, an upstream failure aborts the body without
/// emitting the completion sentinel.
async fn chat_completion(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, (StatusCode, Json<ErrorBody>)> {
    let composed = composer::compose(&request).map_err(error_response)?;

    tracing::debug!(model = %composed.model, turns = composed.messages.len(), "opening upstream stream");

    let upstream = state
        .provider
        .converse_stream(composed)
        .await
        .map_err(error_response)?;

    let (tx, rx) = mpsc::unbounded_channel::<Result<Bytes, Infallible>>();
    // Detached: the task ends when the upstream completes or the caller
    // drops the response body.
    let _forwarder = tokio::spawn(forward_upstream(upstream, tx));

    let body = Body::from_stream(UnboundedReceiverStream::new(rx));
    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// Re-encode upstream events as normalized frames until completion.
///
/// Text deltas map to one frame each, completion maps to the sentinel and
/// closes the stream, every other event kind is dropped. An upstream error
/// closes the stream without a sentinel.
async fn forward_upstream(
    mut upstream: ProviderEventStream,
    tx: mpsc::UnboundedSender<Result<Bytes, Infallible>>,
) {
    while let Some(event) = upstream.next().await {
        match event {
            Ok(ProviderEvent::TextDelta(text)) => {
                let frame = encode_event(&StreamEvent::Text(text));
                if tx.send(Ok(Bytes::from(frame))).is_err() {
                    // Caller hung up; stop reading upstream.
                    return;
                }
            }
            Ok(ProviderEvent::Completion) => {
                let _ = tx.send(Ok(Bytes::from(encode_event(&StreamEvent::Done))));
                return;
            }
            Ok(ProviderEvent::Other) => {}
            Err(err) => {
                tracing::error!("upstream stream error: {err}");
                return;
            }
        }
    }
    tracing::debug!("upstream closed without completion event");
}

/// Map a composition or upstream error to an HTTP error response.
fn error_response(err: ChatError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        ChatError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn test_router() -> Router {
        let state = AppState::with_config(ProviderConfig::default()).unwrap();
        create_router(state)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_empty_history_yields_bad_request() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"messages": []}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("validation"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_yields_bad_gateway() {
        // Default config has no API key, so the upstream call fails before
        // any stream is opened.
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"messages": [{"role": "user", "text": "hi"}]}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("API key"));
    }
}

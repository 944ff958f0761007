//! HTTP receiver for push-style trigger deliveries.
//!
//! `POST /` accepts one [`DocumentCreated`] body per request. Acknowledged
//! invocations answer `200`; propagated failures answer non-2xx so the trigger
//! runtime treats the delivery as failed and may redeliver it.

use std::future::Future;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use geofence::DispatchError;
use serde_json::json;
use tokio::net::TcpListener;

use crate::{DocumentCreated, TriggerHandler};

pub fn router(handler: TriggerHandler) -> Router {
    Router::new()
        .route("/", post(receive))
        .route("/healthz", get(healthz))
        .with_state(handler)
}

/// Serves [`router`] on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    handler: TriggerHandler,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn receive(
    State(handler): State<TriggerHandler>,
    Json(created): Json<DocumentCreated>,
) -> Response {
    match handler.handle(&created).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(err) => {
            let status = match err {
                DispatchError::InvalidEvent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let body = json!({ "status": "failed", "error": err.to_string() });
            (status, Json(body)).into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

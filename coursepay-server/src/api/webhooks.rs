//! Gateway webhook endpoint.
//!
//! The webhook is the authoritative push channel for charge outcomes. It
//! authenticates by HMAC signature over the raw body, not by session, and
//! its responses follow the gateway's retry contract: 2xx acknowledges,
//! anything else asks for redelivery.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use coursepay_core::framework::DatabaseProcessor;
use coursepay_core::gateway::signature::SIGNATURE_HEADER;
use coursepay_core::reconciler::{self, WebhookError};

use crate::state::AppState;

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/paystack", post(paystack_webhook))
}

#[derive(Debug)]
enum WebhookApiError {
    /// Missing or mismatched signature. Not retried by the gateway.
    Signature,
    /// Authenticated but unparseable body.
    Malformed,
    /// Processing failed after authentication; the gateway should retry.
    Processing,
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebhookApiError::Signature => {
                (StatusCode::BAD_REQUEST, "invalid signature").into_response()
            }
            WebhookApiError::Malformed => {
                (StatusCode::BAD_REQUEST, "malformed webhook body").into_response()
            }
            WebhookApiError::Processing => {
                (StatusCode::INTERNAL_SERVER_ERROR, "webhook processing failed").into_response()
            }
        }
    }
}

impl From<WebhookError> for WebhookApiError {
    fn from(error: WebhookError) -> Self {
        match error {
            WebhookError::Signature => WebhookApiError::Signature,
            WebhookError::Malformed(_) => WebhookApiError::Malformed,
            WebhookError::Reconcile(e) => {
                tracing::error!(error = %e, "webhook reconciliation failed");
                WebhookApiError::Processing
            }
        }
    }
}

/// `POST /webhooks/paystack` — authenticate and process one delivery.
///
/// The handler takes the raw body so the signature is computed over the
/// exact bytes the gateway sent.
async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let store = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let ack = reconciler::process_webhook(&store, &*state.gateway, &body, signature).await?;

    tracing::debug!(event_type = %ack.event_type, "webhook acknowledged");
    Ok(Json(serde_json::json!({ "status": "success" })))
}

//! HTTP surface next to the Telegram webhook
//!
//! - `POST /payments/webhook`: payment completion callbacks from the processor
//! - `GET /health`: liveness check

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use yogacore::payments::{process_payment_callback, verify_signature, PaymentCallback, PaymentError, SIGNATURE_HEADER};
use yogacore::{get_connection, DbPool};

/// Shared state for the payment endpoints.
#[derive(Clone)]
pub struct PaymentState {
    pub db_pool: Arc<DbPool>,
    /// When set, callbacks must carry a valid signature
    pub webhook_secret: Option<SecretString>,
}

pub fn payment_router(state: PaymentState) -> Router {
    Router::new()
        .route("/payments/webhook", post(payment_webhook_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn payment_webhook_handler(State(state): State<PaymentState>, headers: HeaderMap, body: Bytes) -> Response {
    match handle_payment_callback(&state, &headers, &body) {
        Ok(receipt) => {
            let message = if receipt.already_processed {
                "Payment already recorded"
            } else {
                "Subscription activated and payment recorded successfully"
            };
            (StatusCode::OK, Json(json!({ "message": message, "receipt": receipt }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn handle_payment_callback(
    state: &PaymentState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<yogacore::payments::PaymentReceipt, PaymentError> {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(secret.expose_secret().as_bytes(), body, signature) {
            return Err(PaymentError::InvalidSignature);
        }
    }

    let callback: PaymentCallback =
        serde_json::from_slice(body).map_err(|e| PaymentError::MalformedPayload(e.to_string()))?;
    log::info!(
        "Payment callback for order {} (status {})",
        callback.order_id,
        callback.payment_status
    );

    let conn = get_connection(&state.db_pool)?;
    process_payment_callback(&conn, &callback, Utc::now())
}

fn error_response(err: PaymentError) -> Response {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if status.is_server_error() {
        log::error!("Payment callback failed: {}", err);
        "Internal error".to_string()
    } else {
        log::warn!("Payment callback rejected: {}", err);
        err.to_string()
    };
    (status, Json(json!({ "error": message }))).into_response()
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

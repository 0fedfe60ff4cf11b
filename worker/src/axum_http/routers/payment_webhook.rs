use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use crates::domain::value_objects::webhooks::PaymentWebhook;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    axum_http::error_responses::error_response,
    usecases::{
        payment_reconciliation::{ConfirmOutcome, ReconciliationError},
        payment_webhook::{WebhookError, PaymentWebhookUseCase},
    },
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/webhooks/payment-gateway/invoice" \
//     -H "x-callback-token: $PAYMENT_GATEWAY_WEBHOOK_TOKEN" \
//     -H "Content-Type: application/json" \
//     -d '{"status":"PAID","external_id":"order-42","amount":50000}'

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

#[derive(Clone)]
pub struct PaymentWebhookState {
    webhook_token: Arc<str>,
    usecase: Arc<PaymentWebhookUseCase>,
}

pub fn routes(webhook_token: String, usecase: Arc<PaymentWebhookUseCase>) -> Router {
    Router::new()
        .route("/invoice", post(invoice_notification))
        .with_state(PaymentWebhookState {
            webhook_token: Arc::from(webhook_token),
            usecase,
        })
}

#[derive(Debug, Serialize)]
pub struct WebhookAckResponse {
    pub result: &'static str,
}

pub async fn invoice_notification(
    State(state): State<PaymentWebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let token = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if token != Some(&*state.webhook_token) {
        warn!("payment_webhook: rejected notification with invalid callback token");
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    // Parsed only once the caller is authenticated.
    let payload = match Json::<PaymentWebhook>::from_bytes(&body) {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "payment_webhook: malformed notification body");
            return rejection.into_response();
        }
    };

    info!(
        external_id = %payload.external_id,
        status = %payload.status,
        amount = %payload.amount,
        "payment_webhook: invoice notification received"
    );

    match state.usecase.handle_invoice_notification(payload).await {
        Ok(ConfirmOutcome::Confirmed) => ack("confirmed"),
        Ok(ConfirmOutcome::AlreadyPaid) => ack("already_paid"),
        Err(WebhookError::Reconciliation(ReconciliationError::PublishExhausted {
            ..
        })) => ack("dead_lettered"),
        Err(err) => map_error(err),
    }
}

fn ack(result: &'static str) -> Response {
    (StatusCode::OK, Json(WebhookAckResponse { result })).into_response()
}

fn map_error(err: WebhookError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "payment_webhook: notification failed");
        // Infra detail stays in the logs.
        return error_response(status, "internal server error");
    }
    warn!(error = %err, "payment_webhook: notification rejected");
    error_response(status, err.to_string())
}

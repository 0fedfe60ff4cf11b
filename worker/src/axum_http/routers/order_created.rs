use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use crates::domain::value_objects::orders::OrderCreatedEvent;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    axum_http::error_responses::error_response,
    usecases::order_intake::{OrderIntakeOutcome, OrderIntakeUseCase},
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/orders/created" \
//     -H "Authorization: Bearer $INTERNAL_ORDER_TOKEN" \
//     -H "Content-Type: application/json" \
//     -d '{"order_id":42,"user_id":7,"amount":"50000.00","payer_email":"buyer@example.com"}'

#[derive(Clone)]
pub struct OrderCreatedRouteState {
    internal_token: Option<Arc<str>>,
    usecase: Arc<OrderIntakeUseCase>,
}

pub fn routes(internal_token: Option<String>, usecase: Arc<OrderIntakeUseCase>) -> Router {
    Router::new()
        .route("/created", post(order_created))
        .with_state(OrderCreatedRouteState {
            internal_token: internal_token.map(Arc::from),
            usecase,
        })
}

#[derive(Debug, Default, Serialize)]
pub struct OrderCreatedResponse {
    pub result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

pub async fn order_created(
    State(state): State<OrderCreatedRouteState>,
    headers: HeaderMap,
    Json(payload): Json<OrderCreatedEvent>,
) -> Response {
    let Some(expected_token) = state.internal_token.as_deref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "order intake token is not configured",
        );
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return error_response(status, "unauthorized");
    }

    let order_id = payload.order_id;
    info!(order_id, "order_created: event received");

    match state.usecase.handle_order_created(payload).await {
        Ok(outcome) => Json(into_response_body(outcome)).into_response(),
        Err(err) if err.status_code().is_server_error() => {
            error!(order_id, error = ?err, "order_created: usecase failed");
            error_response(err.status_code(), "order intake failed")
        }
        Err(err) => {
            warn!(order_id, error = %err, "order_created: event rejected");
            error_response(err.status_code(), err.to_string())
        }
    }
}

fn into_response_body(outcome: OrderIntakeOutcome) -> OrderCreatedResponse {
    match outcome {
        OrderIntakeOutcome::Enqueued { request_id } => OrderCreatedResponse {
            result: "enqueued",
            request_id: Some(request_id),
            ..Default::default()
        },
        OrderIntakeOutcome::InvoiceCreated {
            payment_id,
            external_id,
        } => OrderCreatedResponse {
            result: "invoice_created",
            payment_id: Some(payment_id),
            external_id: Some(external_id),
            ..Default::default()
        },
        OrderIntakeOutcome::AlreadyInvoiced => OrderCreatedResponse {
            result: "already_invoiced",
            ..Default::default()
        },
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    entities::payment_anomalies::InsertPaymentAnomalyEntity,
    repositories::payments::PaymentRepository,
    value_objects::{
        enums::{anomaly_types::AnomalyType, review_statuses::ReviewStatus},
        external_ids::order_id_from_external_id,
        webhooks::{PaymentWebhook, WEBHOOK_STATUS_PAID},
    },
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, warn};

use super::payment_reconciliation::{
    ConfirmOutcome, PaymentReconciliationUseCase, ReconciliationError,
};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("unsupported notification status: {0}")]
    InvalidNotificationStatus(String),
    #[error("amount mismatch for order {order_id}: expected {expected}, got {actual}")]
    AmountMismatch {
        order_id: i64,
        expected: Decimal,
        actual: Decimal,
    },
    #[error("ledger storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidNotificationStatus(_) => StatusCode::BAD_REQUEST,
            WebhookError::AmountMismatch { .. } => StatusCode::CONFLICT,
            WebhookError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::Reconciliation(err) => match err {
                ReconciliationError::UnknownStatus(_) => StatusCode::BAD_REQUEST,
                ReconciliationError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
                ReconciliationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                // Ledger is paid and a dead-letter row exists; a gateway
                // redelivery would change nothing.
                ReconciliationError::PublishExhausted { .. } => StatusCode::OK,
            },
        }
    }
}

pub struct PaymentWebhookUseCase {
    payment_repository: Arc<dyn PaymentRepository + Send + Sync>,
    reconciliation: Arc<PaymentReconciliationUseCase>,
}

impl PaymentWebhookUseCase {
    pub fn new(
        payment_repository: Arc<dyn PaymentRepository + Send + Sync>,
        reconciliation: Arc<PaymentReconciliationUseCase>,
    ) -> Self {
        Self {
            payment_repository,
            reconciliation,
        }
    }

    pub async fn handle_invoice_notification(
        &self,
        payload: PaymentWebhook,
    ) -> Result<ConfirmOutcome, WebhookError> {
        if payload.status != WEBHOOK_STATUS_PAID {
            warn!(
                external_id = %payload.external_id,
                status = %payload.status,
                "payment_webhook: ignoring non-paid notification"
            );
            return Err(WebhookError::InvalidNotificationStatus(payload.status));
        }

        let order_id = order_id_from_external_id(&payload.external_id);
        if order_id == 0 {
            warn!(
                external_id = %payload.external_id,
                "payment_webhook: malformed external id resolved to order 0"
            );
        }

        let expected = self
            .payment_repository
            .get_payment_amount_by_order_id(order_id)
            .await?;

        if expected != payload.amount {
            self.record_amount_anomaly(order_id, &payload.external_id, expected, payload.amount)
                .await;
            return Err(WebhookError::AmountMismatch {
                order_id,
                expected,
                actual: payload.amount,
            });
        }

        let outcome = self
            .reconciliation
            .confirm_payment_success(order_id, &payload.status)
            .await?;

        info!(
            order_id,
            external_id = %payload.external_id,
            outcome = ?outcome,
            "payment_webhook: notification processed"
        );
        Ok(outcome)
    }

    async fn record_amount_anomaly(
        &self,
        order_id: i64,
        external_id: &str,
        expected: Decimal,
        actual: Decimal,
    ) {
        let anomaly = InsertPaymentAnomalyEntity {
            order_id,
            external_id: external_id.to_string(),
            anomaly_type: AnomalyType::InvalidAmount.code(),
            notes: format!("amount mismatch: expected {expected}, got {actual}"),
            status: ReviewStatus::NeedsCheck.code(),
        };

        match self.payment_repository.save_payment_anomaly(anomaly).await {
            Ok(anomaly_id) => error!(
                order_id,
                external_id = %external_id,
                anomaly_id,
                expected = %expected,
                actual = %actual,
                "payment_webhook: amount mismatch recorded as anomaly"
            ),
            Err(err) => error!(
                order_id,
                external_id = %external_id,
                expected = %expected,
                actual = %actual,
                db_error = %err,
                "payment_webhook: amount mismatch, failed to record anomaly"
            ),
        }
    }
}

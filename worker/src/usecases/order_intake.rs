use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    entities::payment_requests::InsertPaymentRequestEntity,
    repositories::payment_requests::PaymentRequestRepository,
    value_objects::{
        enums::payment_request_statuses::PaymentRequestStatus, orders::OrderCreatedEvent,
    },
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::services::invoice_issuer::{InvoiceIssuer, InvoiceOrder, IssueError, IssueOutcome};

#[derive(Debug, Error)]
pub enum OrderIntakeError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),
    #[error("invoice issuing failed: {0}")]
    Issue(#[from] IssueError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrderIntakeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderIntakeError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            OrderIntakeError::Issue(IssueError::Gateway(_)) => StatusCode::BAD_GATEWAY,
            OrderIntakeError::Issue(IssueError::Ledger(_)) | OrderIntakeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderIntakeOutcome {
    Enqueued { request_id: i64 },
    InvoiceCreated { payment_id: i64, external_id: String },
    AlreadyInvoiced,
}

pub struct OrderIntakeUseCase {
    payment_request_repository: Arc<dyn PaymentRequestRepository + Send + Sync>,
    invoice_issuer: Arc<InvoiceIssuer>,
    /// When set, orders are queued for the invoice-creation loop instead of
    /// being invoiced inline.
    disable_create_invoice_directly: bool,
}

impl OrderIntakeUseCase {
    pub fn new(
        payment_request_repository: Arc<dyn PaymentRequestRepository + Send + Sync>,
        invoice_issuer: Arc<InvoiceIssuer>,
        disable_create_invoice_directly: bool,
    ) -> Self {
        Self {
            payment_request_repository,
            invoice_issuer,
            disable_create_invoice_directly,
        }
    }

    pub async fn handle_order_created(
        &self,
        event: OrderCreatedEvent,
    ) -> Result<OrderIntakeOutcome, OrderIntakeError> {
        validate(&event)?;

        let payer_email = Some(event.payer_email.trim().to_string()).filter(|e| !e.is_empty());

        if self.disable_create_invoice_directly {
            let request_id = self
                .payment_request_repository
                .save_payment_request(InsertPaymentRequestEntity {
                    order_id: event.order_id,
                    user_id: event.user_id,
                    amount: event.amount,
                    payer_email,
                    status: PaymentRequestStatus::Pending.to_string(),
                    retry_count: 0,
                    notes: None,
                })
                .await?;

            info!(
                order_id = event.order_id,
                request_id,
                "order_intake: payment request enqueued"
            );
            return Ok(OrderIntakeOutcome::Enqueued { request_id });
        }

        let outcome = self
            .invoice_issuer
            .issue(InvoiceOrder {
                order_id: event.order_id,
                user_id: event.user_id,
                amount: event.amount,
                payer_email,
            })
            .await?;

        Ok(match outcome {
            IssueOutcome::Created {
                payment_id,
                external_id,
            } => OrderIntakeOutcome::InvoiceCreated {
                payment_id,
                external_id,
            },
            IssueOutcome::AlreadyInvoiced => {
                info!(
                    order_id = event.order_id,
                    "order_intake: order already invoiced, skipping"
                );
                OrderIntakeOutcome::AlreadyInvoiced
            }
        })
    }
}

fn validate(event: &OrderCreatedEvent) -> Result<(), OrderIntakeError> {
    if event.order_id <= 0 {
        return Err(OrderIntakeError::InvalidOrder(format!(
            "order_id must be positive, got {}",
            event.order_id
        )));
    }
    if event.amount <= Decimal::ZERO {
        return Err(OrderIntakeError::InvalidOrder(format!(
            "amount must be positive, got {}",
            event.amount
        )));
    }
    Ok(())
}

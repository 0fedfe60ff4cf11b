use std::sync::Arc;

use anyhow::Context;
use crates::domain::{
    entities::payments::InsertPaymentEntity,
    repositories::{payment_gateway::PaymentGateway, payments::PaymentRepository},
    value_objects::{enums::payment_statuses::PaymentStatus, invoices::InvoiceRequest},
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use super::status_translator::StatusTranslator;

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceOrder {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub payer_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Created { payment_id: i64, external_id: String },
    /// A payment row already exists for the order; nothing new was recorded.
    AlreadyInvoiced,
}

#[derive(Debug, Error)]
pub enum IssueError {
    /// The gateway refused or never answered. Counts against the request's
    /// retry budget.
    #[error("{0:#}")]
    Gateway(anyhow::Error),
    /// The ledger could not be read or written. Transient: the request is
    /// left as is for the next pass.
    #[error("{0:#}")]
    Ledger(anyhow::Error),
}

/// Creates the gateway invoice for an order and records it as a Pending
/// payment. Shared by the direct order path and the invoice-creation loop.
pub struct InvoiceIssuer {
    payment_repository: Arc<dyn PaymentRepository + Send + Sync>,
    payment_gateway: Arc<dyn PaymentGateway + Send + Sync>,
    status_translator: Arc<StatusTranslator>,
}

impl InvoiceIssuer {
    pub fn new(
        payment_repository: Arc<dyn PaymentRepository + Send + Sync>,
        payment_gateway: Arc<dyn PaymentGateway + Send + Sync>,
        status_translator: Arc<StatusTranslator>,
    ) -> Self {
        Self {
            payment_repository,
            payment_gateway,
            status_translator,
        }
    }

    pub async fn issue(&self, order: InvoiceOrder) -> Result<IssueOutcome, IssueError> {
        if self
            .payment_repository
            .find_payment_by_order_id(order.order_id)
            .await
            .context("failed to check for an existing payment")
            .map_err(IssueError::Ledger)?
            .is_some()
        {
            return Ok(IssueOutcome::AlreadyInvoiced);
        }

        let invoice = self
            .payment_gateway
            .create_invoice(InvoiceRequest::for_order(
                order.order_id,
                order.amount,
                order.payer_email,
            ))
            .await
            .context("failed to create gateway invoice")
            .map_err(IssueError::Gateway)?;

        let saved = self
            .payment_repository
            .save_payment(InsertPaymentEntity {
                order_id: order.order_id,
                user_id: order.user_id,
                external_id: invoice.external_id.clone(),
                amount: order.amount,
                status: self.status_translator.code_of(PaymentStatus::Pending),
                expired_at: invoice.expiry_date,
            })
            .await
            .context("failed to save pending payment")
            .map_err(IssueError::Ledger)?;

        let Some(payment_id) = saved else {
            warn!(
                order_id = order.order_id,
                external_id = %invoice.external_id,
                "invoice_issuer: order was invoiced concurrently, keeping the existing payment"
            );
            return Ok(IssueOutcome::AlreadyInvoiced);
        };

        info!(
            order_id = order.order_id,
            payment_id,
            external_id = %invoice.external_id,
            expired_at = %invoice.expiry_date,
            "invoice_issuer: gateway invoice recorded"
        );

        Ok(IssueOutcome::Created {
            payment_id,
            external_id: invoice.external_id,
        })
    }
}

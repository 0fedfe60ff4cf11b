use std::{sync::Arc, time::Duration};

use anyhow::Result;
use crates::domain::{
    repositories::{payment_gateway::PaymentGateway, payments::PaymentRepository},
    value_objects::{enums::payment_statuses::PaymentStatus, invoices::InvoiceDetail},
};
use tracing::{error, info, warn};

use crate::{
    services::status_translator::StatusTranslator,
    usecases::payment_reconciliation::{PaymentReconciliationUseCase, ReconciliationError},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInvoicePollingSummary {
    pub scanned: usize,
    pub confirmed: usize,
    pub still_pending: usize,
    pub failed: usize,
}

/// Everything one polling pass needs.
pub struct PendingInvoicePoller {
    pub payment_repository: Arc<dyn PaymentRepository + Send + Sync>,
    pub payment_gateway: Arc<dyn PaymentGateway + Send + Sync>,
    pub reconciliation: Arc<PaymentReconciliationUseCase>,
    pub status_translator: Arc<StatusTranslator>,
}

pub async fn run(poller: PendingInvoicePoller, interval: Duration) -> Result<()> {
    info!(
        interval_secs = interval.as_secs(),
        "pending_invoice_polling: starting loop"
    );
    loop {
        match process_pending_payments(&poller).await {
            Ok(summary) => info!(
                scanned = summary.scanned,
                confirmed = summary.confirmed,
                still_pending = summary.still_pending,
                failed = summary.failed,
                "pending_invoice_polling: batch processed"
            ),
            Err(e) => error!(
                error = %e,
                "pending_invoice_polling: failed to list pending payments"
            ),
        }
        tokio::time::sleep(interval).await;
    }
}

/// Asks the gateway about every Pending payment and confirms the ones it
/// reports as paid. Covers webhooks that never arrived.
pub async fn process_pending_payments(
    poller: &PendingInvoicePoller,
) -> Result<PendingInvoicePollingSummary> {
    let pending_code = poller.status_translator.code_of(PaymentStatus::Pending);
    let payments = poller
        .payment_repository
        .list_payments_by_status(pending_code)
        .await?;

    let mut summary = PendingInvoicePollingSummary {
        scanned: payments.len(),
        ..Default::default()
    };

    for payment in payments {
        let gateway_status = match poller
            .payment_gateway
            .check_invoice_status(payment.external_id.clone())
            .await
        {
            Ok(status) => status,
            Err(e) => {
                summary.failed += 1;
                warn!(
                    order_id = payment.order_id,
                    external_id = %payment.external_id,
                    error = %e,
                    "pending_invoice_polling: failed to check invoice status"
                );
                continue;
            }
        };

        if !InvoiceDetail::is_paid_status(&gateway_status) {
            summary.still_pending += 1;
            continue;
        }

        info!(
            order_id = payment.order_id,
            external_id = %payment.external_id,
            gateway_status = %gateway_status,
            "pending_invoice_polling: gateway reports paid, confirming"
        );

        match poller
            .reconciliation
            .confirm_payment_success(payment.order_id, PaymentStatus::Paid.as_str())
            .await
        {
            // Exhaustion still commits the Paid status with a dead-letter row.
            Ok(_) | Err(ReconciliationError::PublishExhausted { .. }) => summary.confirmed += 1,
            Err(e) => {
                summary.failed += 1;
                error!(
                    order_id = payment.order_id,
                    external_id = %payment.external_id,
                    error = %e,
                    "pending_invoice_polling: failed to confirm payment"
                );
            }
        }
    }

    Ok(summary)
}

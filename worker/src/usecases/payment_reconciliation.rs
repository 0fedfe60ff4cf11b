use std::{sync::Arc, time::Duration};

use backon::Retryable;
use crates::domain::{
    entities::failed_events::InsertFailedEventEntity,
    repositories::{
        payment_events::PaymentEventPublisher,
        payments::{PaymentLedgerTransaction, PaymentRepository},
    },
    value_objects::{
        enums::{
            failed_event_types::FailedEventType, payment_statuses::PaymentStatus,
            review_statuses::ReviewStatus,
        },
        external_ids::external_id_for_order,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::services::{
    publish_retry::PublishRetryPolicy,
    status_translator::{StatusError, StatusTranslator},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Status written and the success event published.
    Confirmed,
    /// The order was already paid; nothing was written or published.
    AlreadyPaid,
}

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error(transparent)]
    UnknownStatus(#[from] StatusError),
    #[error("payment for order {0} not found")]
    PaymentNotFound(i64),
    #[error("ledger storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
    /// The status change is committed and a dead-letter row records the
    /// unpublished event.
    #[error(
        "payment success for order {order_id} not published after {attempts} attempts: {source:#}"
    )]
    PublishExhausted {
        order_id: i64,
        attempts: u32,
        source: anyhow::Error,
    },
}

pub struct PaymentReconciliationUseCase {
    payment_repository: Arc<dyn PaymentRepository + Send + Sync>,
    event_publisher: Arc<dyn PaymentEventPublisher + Send + Sync>,
    status_translator: Arc<StatusTranslator>,
    retry_policy: PublishRetryPolicy,
}

impl PaymentReconciliationUseCase {
    pub fn new(
        payment_repository: Arc<dyn PaymentRepository + Send + Sync>,
        event_publisher: Arc<dyn PaymentEventPublisher + Send + Sync>,
        status_translator: Arc<StatusTranslator>,
        retry_policy: PublishRetryPolicy,
    ) -> Self {
        Self {
            payment_repository,
            event_publisher,
            status_translator,
            retry_policy,
        }
    }

    /// Moves the order's payment to `status_name` and publishes the success
    /// event, both inside one ledger transaction.
    ///
    /// The transaction stays open while publishing is retried. When every
    /// attempt fails the status change is still committed, together with a
    /// dead-letter row, and `PublishExhausted` is returned. Any ledger write
    /// failure rolls the whole scope back.
    pub async fn confirm_payment_success(
        &self,
        order_id: i64,
        status_name: &str,
    ) -> Result<ConfirmOutcome, ReconciliationError> {
        let status_code = self.status_translator.name_to_code(status_name)?;
        let paid_code = self.status_translator.code_of(PaymentStatus::Paid);

        if self
            .payment_repository
            .is_already_paid(order_id, paid_code)
            .await?
        {
            info!(order_id, "payment_reconciliation: order already paid, skipping");
            return Ok(ConfirmOutcome::AlreadyPaid);
        }

        let mut tx = self.payment_repository.begin_transaction().await?;

        let updated = match tx.update_status(order_id, status_code, paid_code) {
            Ok(updated) => updated,
            Err(err) => {
                abort(tx, order_id);
                return Err(ReconciliationError::Storage(err));
            }
        };

        if updated == 0 {
            abort(tx, order_id);
            return self.classify_unchanged(order_id, paid_code).await;
        }

        let Err(publish_err) = self.publish_with_retry(order_id).await else {
            tx.commit()?;
            info!(order_id, status = %status_name, "payment_reconciliation: payment confirmed");
            return Ok(ConfirmOutcome::Confirmed);
        };

        let dead_letter = InsertFailedEventEntity {
            order_id,
            external_id: external_id_for_order(order_id),
            failed_type: FailedEventType::PublishPaymentSuccess.code(),
            notes: format!("{publish_err:#}"),
            status: ReviewStatus::NeedsCheck.code(),
        };
        if let Err(err) = tx.save_failed_event(dead_letter) {
            abort(tx, order_id);
            error!(
                order_id,
                db_error = %err,
                publish_error = %publish_err,
                "payment_reconciliation: failed to record dead-letter event, status change rolled back"
            );
            return Err(ReconciliationError::Storage(err));
        }
        tx.commit()?;

        error!(
            order_id,
            attempts = self.retry_policy.max_attempts,
            error = %publish_err,
            "payment_reconciliation: publish retries exhausted, dead-letter event recorded"
        );

        Err(ReconciliationError::PublishExhausted {
            order_id,
            attempts: self.retry_policy.max_attempts,
            source: publish_err,
        })
    }

    async fn publish_with_retry(&self, order_id: i64) -> anyhow::Result<()> {
        let publisher = self.event_publisher.as_ref();
        let mut failed_attempts = 0u32;
        (move || publisher.publish_payment_success(order_id))
            .retry(self.retry_policy.backoff())
            .sleep(tokio::time::sleep)
            .notify(|err: &anyhow::Error, delay: Duration| {
                failed_attempts += 1;
                warn!(
                    order_id,
                    attempt = failed_attempts,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "payment_reconciliation: publish failed, retrying"
                );
            })
            .await
    }

    /// Zero rows changed: either a concurrent confirmation won the race or
    /// the order has no payment row at all.
    async fn classify_unchanged(
        &self,
        order_id: i64,
        paid_code: i64,
    ) -> Result<ConfirmOutcome, ReconciliationError> {
        match self
            .payment_repository
            .find_payment_by_order_id(order_id)
            .await?
        {
            Some(payment) if payment.status == paid_code => {
                info!(order_id, "payment_reconciliation: order paid concurrently, skipping");
                Ok(ConfirmOutcome::AlreadyPaid)
            }
            _ => {
                warn!(order_id, "payment_reconciliation: no payment row to confirm");
                Err(ReconciliationError::PaymentNotFound(order_id))
            }
        }
    }
}

fn abort(mut tx: Box<dyn PaymentLedgerTransaction>, order_id: i64) {
    if let Err(err) = tx.rollback() {
        error!(
            order_id,
            db_error = %err,
            "payment_reconciliation: rollback failed"
        );
    }
}

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::payments::PaymentRepository,
    value_objects::enums::payment_statuses::PaymentStatus,
};
use tracing::{error, info};

use crate::services::status_translator::StatusTranslator;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpirySweepSummary {
    pub scanned: usize,
    pub expired: usize,
    /// Left Pending between listing and writing, e.g. paid concurrently.
    pub skipped: usize,
    pub failed: usize,
}

pub async fn run(
    payment_repo: Arc<dyn PaymentRepository + Send + Sync>,
    status_translator: Arc<StatusTranslator>,
    interval: Duration,
) -> Result<()> {
    info!(interval_secs = interval.as_secs(), "expiry_sweep: starting loop");
    loop {
        match process_expired_payments(&payment_repo, &status_translator, Utc::now()).await {
            Ok(summary) if summary.scanned > 0 => info!(
                scanned = summary.scanned,
                expired = summary.expired,
                skipped = summary.skipped,
                failed = summary.failed,
                "expiry_sweep: batch processed"
            ),
            Ok(_) => {}
            Err(e) => error!(
                error = %e,
                "expiry_sweep: failed to list expired payments"
            ),
        }
        tokio::time::sleep(interval).await;
    }
}

pub async fn process_expired_payments(
    payment_repo: &Arc<dyn PaymentRepository + Send + Sync>,
    status_translator: &StatusTranslator,
    now: DateTime<Utc>,
) -> Result<ExpirySweepSummary> {
    let pending = status_translator.code_of(PaymentStatus::Pending);
    let expired = status_translator.code_of(PaymentStatus::Expired);

    let payments = payment_repo
        .list_payments_expired_before(pending, now)
        .await?;
    let mut summary = ExpirySweepSummary {
        scanned: payments.len(),
        ..Default::default()
    };

    for payment in payments {
        match payment_repo
            .transition_status(payment.id, pending, expired)
            .await
        {
            Ok(true) => {
                summary.expired += 1;
                info!(
                    payment_id = payment.id,
                    order_id = payment.order_id,
                    expired_at = %payment.expired_at,
                    "expiry_sweep: payment expired"
                );
            }
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                summary.failed += 1;
                error!(
                    payment_id = payment.id,
                    order_id = payment.order_id,
                    error = %e,
                    "expiry_sweep: failed to expire payment"
                );
            }
        }
    }

    Ok(summary)
}

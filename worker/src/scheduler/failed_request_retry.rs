use std::{sync::Arc, time::Duration};

use anyhow::Result;
use crates::domain::repositories::payment_requests::PaymentRequestRepository;
use tracing::{error, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailedRequestRetrySummary {
    pub scanned: usize,
    pub reset: usize,
    pub failed: usize,
}

pub async fn run(
    request_repo: Arc<dyn PaymentRequestRepository + Send + Sync>,
    max_retries: i32,
    interval: Duration,
) -> Result<()> {
    info!(
        interval_secs = interval.as_secs(),
        max_retries,
        "failed_request_retry: starting loop"
    );
    loop {
        match process_failed_requests(&request_repo, max_retries).await {
            Ok(summary) if summary.scanned > 0 => info!(
                scanned = summary.scanned,
                reset = summary.reset,
                failed = summary.failed,
                "failed_request_retry: batch processed"
            ),
            Ok(_) => {}
            Err(e) => error!(
                error = %e,
                "failed_request_retry: failed to list failed payment requests"
            ),
        }
        tokio::time::sleep(interval).await;
    }
}

/// Puts Failed requests below the retry ceiling back into Pending for the
/// invoice-creation loop.
pub async fn process_failed_requests(
    request_repo: &Arc<dyn PaymentRequestRepository + Send + Sync>,
    max_retries: i32,
) -> Result<FailedRequestRetrySummary> {
    let requests = request_repo
        .list_retryable_failed_payment_requests(max_retries)
        .await?;
    let mut summary = FailedRequestRetrySummary {
        scanned: requests.len(),
        ..Default::default()
    };

    for request in requests {
        match request_repo.reset_to_pending(request.id).await {
            Ok(()) => {
                summary.reset += 1;
                info!(
                    request_id = request.id,
                    order_id = request.order_id,
                    retry_count = request.retry_count,
                    "failed_request_retry: request reset to pending"
                );
            }
            Err(e) => {
                summary.failed += 1;
                error!(
                    request_id = request.id,
                    error = %e,
                    "failed_request_retry: failed to reset request"
                );
                // Counts against the ceiling, so a request that can never be
                // reset stops being picked up.
                let notes = format!("reset to pending failed: {e:#}");
                if let Err(mark_err) = request_repo.mark_failed(request.id, notes).await {
                    error!(
                        request_id = request.id,
                        error = %mark_err,
                        "failed_request_retry: failed to record reset failure"
                    );
                }
            }
        }
    }

    Ok(summary)
}

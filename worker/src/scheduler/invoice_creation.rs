use std::{sync::Arc, time::Duration};

use anyhow::Result;
use crates::domain::{
    entities::payment_requests::PaymentRequestEntity,
    repositories::payment_requests::PaymentRequestRepository,
};
use tracing::{error, info, warn};

use crate::services::invoice_issuer::{InvoiceIssuer, InvoiceOrder, IssueError, IssueOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceCreationSummary {
    pub scanned: usize,
    pub created: usize,
    pub already_invoiced: usize,
    pub failed: usize,
    /// Left Pending because the ledger was unavailable.
    pub deferred: usize,
}

pub async fn run(
    request_repo: Arc<dyn PaymentRequestRepository + Send + Sync>,
    issuer: Arc<InvoiceIssuer>,
    interval: Duration,
) -> Result<()> {
    info!(interval_secs = interval.as_secs(), "invoice_creation: starting loop");
    loop {
        match process_pending_requests(&request_repo, &issuer).await {
            Ok(summary) if summary.scanned > 0 => info!(
                scanned = summary.scanned,
                created = summary.created,
                already_invoiced = summary.already_invoiced,
                failed = summary.failed,
                deferred = summary.deferred,
                "invoice_creation: batch processed"
            ),
            Ok(_) => {}
            Err(e) => error!(
                error = %e,
                "invoice_creation: failed to list pending payment requests"
            ),
        }
        tokio::time::sleep(interval).await;
    }
}

/// One pass over the Pending requests, oldest first.
pub async fn process_pending_requests(
    request_repo: &Arc<dyn PaymentRequestRepository + Send + Sync>,
    issuer: &InvoiceIssuer,
) -> Result<InvoiceCreationSummary> {
    let requests = request_repo.list_pending_payment_requests().await?;
    let mut summary = InvoiceCreationSummary {
        scanned: requests.len(),
        ..Default::default()
    };

    for request in requests {
        match issuer.issue(invoice_order(&request)).await {
            Ok(outcome) => {
                match outcome {
                    IssueOutcome::Created { .. } => summary.created += 1,
                    IssueOutcome::AlreadyInvoiced => summary.already_invoiced += 1,
                }
                if let Err(e) = request_repo.mark_success(request.id).await {
                    // The payment row exists, so the next pass takes the
                    // already-invoiced branch and retries this write.
                    error!(
                        request_id = request.id,
                        order_id = request.order_id,
                        error = %e,
                        "invoice_creation: failed to mark request success"
                    );
                }
            }
            Err(IssueError::Ledger(e)) => {
                summary.deferred += 1;
                warn!(
                    request_id = request.id,
                    order_id = request.order_id,
                    error = %e,
                    "invoice_creation: ledger unavailable, leaving request pending"
                );
            }
            Err(IssueError::Gateway(e)) => {
                summary.failed += 1;
                error!(
                    request_id = request.id,
                    order_id = request.order_id,
                    retry_count = request.retry_count,
                    error = %e,
                    "invoice_creation: failed to create invoice"
                );
                if let Err(mark_err) = request_repo.mark_failed(request.id, format!("{e:#}")).await
                {
                    error!(
                        request_id = request.id,
                        error = %mark_err,
                        "invoice_creation: failed to mark request failed"
                    );
                }
            }
        }
    }

    Ok(summary)
}

fn invoice_order(request: &PaymentRequestEntity) -> InvoiceOrder {
    InvoiceOrder {
        order_id: request.order_id,
        user_id: request.user_id,
        amount: request.amount,
        payer_email: request.payer_email.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::status_translator::{StatusTranslator, seeded_catalog};
    use chrono::{Duration as ChronoDuration, Utc};
    use crates::domain::{
        entities::payments::PaymentEntity,
        repositories::{
            payment_gateway::MockPaymentGateway, payment_requests::MockPaymentRequestRepository,
            payments::MockPaymentRepository,
        },
        value_objects::invoices::InvoiceDetail,
    };
    use mockall::{Sequence, predicate::eq};
    use rust_decimal_macros::dec;

    fn request(id: i64, order_id: i64) -> PaymentRequestEntity {
        let now = Utc::now();
        PaymentRequestEntity {
            id,
            order_id,
            user_id: 7,
            amount: dec!(50.00),
            payer_email: None,
            status: "pending".to_string(),
            retry_count: 0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn issuer(payments: MockPaymentRepository, gateway: MockPaymentGateway) -> InvoiceIssuer {
        InvoiceIssuer::new(
            Arc::new(payments),
            Arc::new(gateway),
            Arc::new(StatusTranslator::from_statuses(seeded_catalog()).unwrap()),
        )
    }

    #[tokio::test]
    async fn saves_payment_before_marking_success() {
        let mut seq = Sequence::new();
        let mut requests = MockPaymentRequestRepository::new();
        requests
            .expect_list_pending_payment_requests()
            .returning(|| Ok(vec![request(1, 42)]));

        let mut payments = MockPaymentRepository::new();
        payments
            .expect_find_payment_by_order_id()
            .returning(|_| Ok(None));
        payments
            .expect_save_payment()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(10)));
        requests
            .expect_mark_success()
            .with(eq(1))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        requests.expect_mark_failed().never();

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_invoice().returning(|request| {
            Ok(InvoiceDetail {
                id: "inv_1".to_string(),
                external_id: request.external_id,
                status: "PENDING".to_string(),
                invoice_url: None,
                expiry_date: Utc::now() + ChronoDuration::hours(24),
            })
        });

        let requests: Arc<dyn PaymentRequestRepository + Send + Sync> = Arc::new(requests);
        let summary = process_pending_requests(&requests, &issuer(payments, gateway))
            .await
            .unwrap();

        assert_eq!(
            summary,
            InvoiceCreationSummary {
                scanned: 1,
                created: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn existing_payment_marks_request_success_without_invoicing() {
        let mut requests = MockPaymentRequestRepository::new();
        requests
            .expect_list_pending_payment_requests()
            .returning(|| Ok(vec![request(1, 42)]));
        requests
            .expect_mark_success()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(()));

        let mut payments = MockPaymentRepository::new();
        payments.expect_find_payment_by_order_id().returning(|_| {
            let now = Utc::now();
            Ok(Some(PaymentEntity {
                id: 10,
                order_id: 42,
                user_id: 7,
                external_id: "order-42".to_string(),
                amount: dec!(50.00),
                status: 1,
                created_at: now,
                expired_at: now,
                updated_at: now,
            }))
        });

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_invoice().never();

        let requests: Arc<dyn PaymentRequestRepository + Send + Sync> = Arc::new(requests);
        let summary = process_pending_requests(&requests, &issuer(payments, gateway))
            .await
            .unwrap();

        assert_eq!(summary.already_invoiced, 1);
    }

    #[tokio::test]
    async fn gateway_failure_marks_request_failed_and_continues() {
        let mut requests = MockPaymentRequestRepository::new();
        requests
            .expect_list_pending_payment_requests()
            .returning(|| Ok(vec![request(1, 41), request(2, 42)]));
        requests
            .expect_mark_failed()
            .withf(|id, notes| *id == 1 && notes.contains("gateway unavailable"))
            .times(1)
            .returning(|_, _| Ok(()));
        requests
            .expect_mark_success()
            .with(eq(2))
            .times(1)
            .returning(|_| Ok(()));

        let mut payments = MockPaymentRepository::new();
        payments
            .expect_find_payment_by_order_id()
            .returning(|_| Ok(None));
        payments.expect_save_payment().times(1).returning(|_| Ok(Some(10)));

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_invoice().returning(|request| {
            if request.external_id == "order-41" {
                return Err(anyhow::anyhow!("gateway unavailable"));
            }
            Ok(InvoiceDetail {
                id: "inv_2".to_string(),
                external_id: request.external_id,
                status: "PENDING".to_string(),
                invoice_url: None,
                expiry_date: Utc::now() + ChronoDuration::hours(24),
            })
        });

        let requests: Arc<dyn PaymentRequestRepository + Send + Sync> = Arc::new(requests);
        let summary = process_pending_requests(&requests, &issuer(payments, gateway))
            .await
            .unwrap();

        assert_eq!(
            summary,
            InvoiceCreationSummary {
                scanned: 2,
                created: 1,
                already_invoiced: 0,
                failed: 1,
                deferred: 0,
            }
        );
    }

    #[tokio::test]
    async fn ledger_outage_leaves_requests_pending() {
        let mut requests = MockPaymentRequestRepository::new();
        requests
            .expect_list_pending_payment_requests()
            .returning(|| Ok(vec![request(1, 42)]));
        requests.expect_mark_failed().never();
        requests.expect_mark_success().never();

        let mut payments = MockPaymentRepository::new();
        payments
            .expect_find_payment_by_order_id()
            .returning(|_| Err(anyhow::anyhow!("pool timed out")));

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_invoice().never();

        let requests: Arc<dyn PaymentRequestRepository + Send + Sync> = Arc::new(requests);
        let summary = process_pending_requests(&requests, &issuer(payments, gateway))
            .await
            .unwrap();

        assert_eq!(
            summary,
            InvoiceCreationSummary {
                scanned: 1,
                deferred: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn failed_payment_save_does_not_spend_a_retry() {
        let mut requests = MockPaymentRequestRepository::new();
        requests
            .expect_list_pending_payment_requests()
            .returning(|| Ok(vec![request(1, 42)]));
        requests.expect_mark_failed().never();
        requests.expect_mark_success().never();

        let mut payments = MockPaymentRepository::new();
        payments
            .expect_find_payment_by_order_id()
            .returning(|_| Ok(None));
        payments
            .expect_save_payment()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_invoice().times(1).returning(|request| {
            Ok(InvoiceDetail {
                id: "inv_1".to_string(),
                external_id: request.external_id,
                status: "PENDING".to_string(),
                invoice_url: None,
                expiry_date: Utc::now() + ChronoDuration::hours(24),
            })
        });

        let requests: Arc<dyn PaymentRequestRepository + Send + Sync> = Arc::new(requests);
        let summary = process_pending_requests(&requests, &issuer(payments, gateway))
            .await
            .unwrap();

        assert_eq!(summary.deferred, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn listing_failure_skips_the_iteration() {
        let mut requests = MockPaymentRequestRepository::new();
        requests
            .expect_list_pending_payment_requests()
            .returning(|| Err(anyhow::anyhow!("pool timed out")));

        let requests: Arc<dyn PaymentRequestRepository + Send + Sync> = Arc::new(requests);
        let result = process_pending_requests(
            &requests,
            &issuer(MockPaymentRepository::new(), MockPaymentGateway::new()),
        )
        .await;

        assert!(result.is_err());
    }
}

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crates::domain::{
    entities::{
        failed_events::InsertFailedEventEntity,
        payment_anomalies::InsertPaymentAnomalyEntity,
        payment_requests::{InsertPaymentRequestEntity, PaymentRequestEntity},
        payment_statuses::PaymentStatusEntity,
        payments::{InsertPaymentEntity, PaymentEntity},
    },
    repositories::{
        payment_events::PaymentEventPublisher,
        payment_gateway::PaymentGateway,
        payment_requests::PaymentRequestRepository,
        payment_statuses::PaymentStatusCatalogRepository,
        payments::{PaymentLedgerTransaction, PaymentRepository},
    },
    value_objects::invoices::{InvoiceDetail, InvoiceRequest},
};
use payment_worker::{
    scheduler::pending_invoice_polling::PendingInvoicePoller,
    services::{
        invoice_issuer::InvoiceIssuer, publish_retry::PublishRetryPolicy,
        status_translator::StatusTranslator,
    },
    usecases::{
        order_intake::OrderIntakeUseCase, payment_reconciliation::PaymentReconciliationUseCase,
        payment_webhook::PaymentWebhookUseCase,
    },
};
use rust_decimal::Decimal;

pub const PENDING: i64 = 1;
pub const PAID: i64 = 2;
pub const EXPIRED: i64 = 3;
pub const FAILED: i64 = 4;

#[derive(Default)]
struct LedgerState {
    next_id: i64,
    payments: Vec<PaymentEntity>,
    requests: Vec<PaymentRequestEntity>,
    anomalies: Vec<InsertPaymentAnomalyEntity>,
    failed_events: Vec<InsertFailedEventEntity>,
}

impl LedgerState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing creation times keep oldest-first ordering stable.
    fn created_at(&self) -> DateTime<Utc> {
        Utc::now() + ChronoDuration::milliseconds(self.next_id)
    }
}

/// Ledger kept in memory. Transactions stage their writes and apply them
/// only on commit.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    fail_status_writes: Arc<AtomicBool>,
    fail_failed_event_writes: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub fn fail_status_writes(&self) {
        self.fail_status_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_failed_event_writes(&self) {
        self.fail_failed_event_writes.store(true, Ordering::SeqCst);
    }

    pub fn seed_payment(
        &self,
        order_id: i64,
        amount: Decimal,
        status: i64,
        expired_at: DateTime<Utc>,
    ) -> i64 {
        let mut state = self.state.lock().unwrap();
        assert!(
            state.payments.iter().all(|p| p.order_id != order_id),
            "order {order_id} already has a payment row"
        );
        let id = state.next_id();
        let created_at = state.created_at();
        state.payments.push(PaymentEntity {
            id,
            order_id,
            user_id: 7,
            external_id: format!("order-{order_id}"),
            amount,
            status,
            created_at,
            expired_at,
            updated_at: created_at,
        });
        id
    }

    pub fn payment(&self, order_id: i64) -> Option<PaymentEntity> {
        let state = self.state.lock().unwrap();
        state
            .payments
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned()
    }

    pub fn request(&self, request_id: i64) -> Option<PaymentRequestEntity> {
        let state = self.state.lock().unwrap();
        state.requests.iter().find(|r| r.id == request_id).cloned()
    }

    pub fn anomalies(&self) -> Vec<InsertPaymentAnomalyEntity> {
        self.state.lock().unwrap().anomalies.clone()
    }

    pub fn failed_events(&self) -> Vec<InsertFailedEventEntity> {
        self.state.lock().unwrap().failed_events.clone()
    }
}

#[async_trait]
impl PaymentStatusCatalogRepository for InMemoryLedger {
    async fn list_statuses(&self) -> Result<Vec<PaymentStatusEntity>> {
        Ok([
            (PENDING, "PENDING"),
            (PAID, "PAID"),
            (EXPIRED, "EXPIRED"),
            (FAILED, "FAILED"),
        ]
        .into_iter()
        .map(|(id, name)| PaymentStatusEntity {
            id,
            name: name.to_string(),
        })
        .collect())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryLedger {
    async fn begin_transaction(&self) -> Result<Box<dyn PaymentLedgerTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            ledger: self.clone(),
            status_updates: Vec::new(),
            failed_events: Vec::new(),
            open: true,
        }))
    }

    async fn is_already_paid(&self, order_id: i64, paid_status: i64) -> Result<bool> {
        Ok(self
            .payment(order_id)
            .is_some_and(|p| p.status == paid_status))
    }

    async fn find_payment_by_order_id(&self, order_id: i64) -> Result<Option<PaymentEntity>> {
        Ok(self.payment(order_id))
    }

    async fn get_payment_amount_by_order_id(&self, order_id: i64) -> Result<Decimal> {
        self.payment(order_id)
            .map(|p| p.amount)
            .ok_or_else(|| anyhow!("payment for order {order_id} not found"))
    }

    async fn save_payment(&self, payment: InsertPaymentEntity) -> Result<Option<i64>> {
        let mut state = self.state.lock().unwrap();
        if state.payments.iter().any(|p| p.order_id == payment.order_id) {
            return Ok(None);
        }
        let id = state.next_id();
        let created_at = state.created_at();
        state.payments.push(PaymentEntity {
            id,
            order_id: payment.order_id,
            user_id: payment.user_id,
            external_id: payment.external_id,
            amount: payment.amount,
            status: payment.status,
            created_at,
            expired_at: payment.expired_at,
            updated_at: created_at,
        });
        Ok(Some(id))
    }

    async fn list_payments_by_status(&self, status: i64) -> Result<Vec<PaymentEntity>> {
        let state = self.state.lock().unwrap();
        let mut payments: Vec<_> = state
            .payments
            .iter()
            .filter(|p| p.status == status)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn list_payments_expired_before(
        &self,
        status: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PaymentEntity>> {
        let state = self.state.lock().unwrap();
        let mut payments: Vec<_> = state
            .payments
            .iter()
            .filter(|p| p.status == status && p.expired_at < cutoff)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn transition_status(&self, payment_id: i64, from: i64, to: i64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id && p.status == from)
        {
            Some(payment) => {
                payment.status = to;
                payment.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_payment_anomaly(&self, anomaly: InsertPaymentAnomalyEntity) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.anomalies.push(anomaly);
        Ok(id)
    }
}

pub struct InMemoryTransaction {
    ledger: InMemoryLedger,
    status_updates: Vec<(i64, i64, i64)>,
    failed_events: Vec<InsertFailedEventEntity>,
    open: bool,
}

impl PaymentLedgerTransaction for InMemoryTransaction {
    fn update_status(&mut self, order_id: i64, status: i64, unless_status: i64) -> Result<usize> {
        if self.ledger.fail_status_writes.load(Ordering::SeqCst) {
            bail!("status write failed");
        }
        let state = self.ledger.state.lock().unwrap();
        let matched = state
            .payments
            .iter()
            .filter(|p| p.order_id == order_id && p.status != unless_status)
            .count();
        if matched > 0 {
            self.status_updates.push((order_id, status, unless_status));
        }
        Ok(matched)
    }

    fn save_failed_event(&mut self, event: InsertFailedEventEntity) -> Result<i64> {
        if self.ledger.fail_failed_event_writes.load(Ordering::SeqCst) {
            bail!("failed event write failed");
        }
        self.failed_events.push(event);
        Ok(self.failed_events.len() as i64)
    }

    fn commit(&mut self) -> Result<()> {
        if !self.open {
            bail!("transaction already finished");
        }
        self.open = false;
        let mut state = self.ledger.state.lock().unwrap();
        for (order_id, status, unless_status) in self.status_updates.drain(..) {
            for payment in state
                .payments
                .iter_mut()
                .filter(|p| p.order_id == order_id && p.status != unless_status)
            {
                payment.status = status;
                payment.updated_at = Utc::now();
            }
        }
        state.failed_events.append(&mut self.failed_events);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.open = false;
        self.status_updates.clear();
        self.failed_events.clear();
        Ok(())
    }
}

#[async_trait]
impl PaymentRequestRepository for InMemoryLedger {
    async fn save_payment_request(&self, request: InsertPaymentRequestEntity) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let created_at = state.created_at();
        state.requests.push(PaymentRequestEntity {
            id,
            order_id: request.order_id,
            user_id: request.user_id,
            amount: request.amount,
            payer_email: request.payer_email,
            status: request.status,
            retry_count: request.retry_count,
            notes: request.notes,
            created_at,
            updated_at: created_at,
        });
        Ok(id)
    }

    async fn list_pending_payment_requests(&self) -> Result<Vec<PaymentRequestEntity>> {
        let state = self.state.lock().unwrap();
        let mut requests: Vec<_> = state
            .requests
            .iter()
            .filter(|r| r.status == "pending")
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn list_retryable_failed_payment_requests(
        &self,
        max_retries: i32,
    ) -> Result<Vec<PaymentRequestEntity>> {
        let state = self.state.lock().unwrap();
        let mut requests: Vec<_> = state
            .requests
            .iter()
            .filter(|r| r.status == "failed" && r.retry_count < max_retries)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn mark_success(&self, request_id: i64) -> Result<()> {
        self.update_request(request_id, |r| r.status = "success".to_string())
    }

    async fn mark_failed(&self, request_id: i64, notes: String) -> Result<()> {
        self.update_request(request_id, |r| {
            r.status = "failed".to_string();
            r.retry_count += 1;
            r.notes = Some(notes);
        })
    }

    async fn reset_to_pending(&self, request_id: i64) -> Result<()> {
        self.update_request(request_id, |r| {
            if r.status == "failed" {
                r.status = "pending".to_string();
            }
        })
    }
}

impl InMemoryLedger {
    fn update_request(
        &self,
        request_id: i64,
        apply: impl FnOnce(&mut PaymentRequestEntity),
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| anyhow!("payment request {request_id} not found"))?;
        apply(request);
        request.updated_at = Utc::now();
        Ok(())
    }
}

/// Gateway double: invoices expire in a day and report whatever status the
/// test sets.
#[derive(Default)]
pub struct FakeGateway {
    statuses: Mutex<HashMap<String, String>>,
    created: Mutex<Vec<InvoiceRequest>>,
    status_checks: AtomicU32,
    fail_creates: AtomicBool,
}

impl FakeGateway {
    pub fn set_status(&self, external_id: &str, status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(external_id.to_string(), status.to_string());
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> Vec<InvoiceRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn status_checks(&self) -> u32 {
        self.status_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<InvoiceDetail> {
        if self.fail_creates.load(Ordering::SeqCst) {
            bail!("payment gateway request timed out: create invoice");
        }
        self.set_status(&request.external_id, "PENDING");
        self.created.lock().unwrap().push(request.clone());
        Ok(InvoiceDetail {
            id: format!("inv_{}", request.external_id),
            external_id: request.external_id,
            status: "PENDING".to_string(),
            invoice_url: None,
            expiry_date: Utc::now() + ChronoDuration::hours(24),
        })
    }

    async fn check_invoice_status(&self, external_id: String) -> Result<String> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .get(&external_id)
            .cloned()
            .ok_or_else(|| anyhow!("invoice {external_id} not found"))
    }
}

/// Publisher that fails its first `failures` calls.
#[derive(Default)]
pub struct FlakyPublisher {
    failures: AtomicU32,
    attempts: AtomicU32,
    published: Mutex<Vec<i64>>,
}

impl FlakyPublisher {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<i64> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentEventPublisher for FlakyPublisher {
    async fn publish_payment_success(&self, order_id: i64) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures.load(Ordering::SeqCst) {
            bail!("event bus unavailable (attempt {attempt})");
        }
        self.published.lock().unwrap().push(order_id);
        Ok(())
    }
}

pub struct Harness {
    pub ledger: InMemoryLedger,
    pub gateway: Arc<FakeGateway>,
    pub publisher: Arc<FlakyPublisher>,
    pub translator: Arc<StatusTranslator>,
    pub payments: Arc<dyn PaymentRepository + Send + Sync>,
    pub requests: Arc<dyn PaymentRequestRepository + Send + Sync>,
    pub reconciliation: Arc<PaymentReconciliationUseCase>,
    pub issuer: Arc<InvoiceIssuer>,
    pub webhook: PaymentWebhookUseCase,
    pub intake: OrderIntakeUseCase,
}

impl Harness {
    pub async fn new(publisher: FlakyPublisher, queue_orders: bool) -> Self {
        let ledger = InMemoryLedger::default();
        let gateway = Arc::new(FakeGateway::default());
        let publisher = Arc::new(publisher);
        let translator = Arc::new(StatusTranslator::load(&ledger).await.unwrap());

        let payments: Arc<dyn PaymentRepository + Send + Sync> = Arc::new(ledger.clone());
        let requests: Arc<dyn PaymentRequestRepository + Send + Sync> = Arc::new(ledger.clone());

        let reconciliation = Arc::new(PaymentReconciliationUseCase::new(
            Arc::clone(&payments),
            publisher.clone(),
            Arc::clone(&translator),
            PublishRetryPolicy {
                max_attempts: 5,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(4),
            },
        ));
        let issuer = Arc::new(InvoiceIssuer::new(
            Arc::clone(&payments),
            gateway.clone(),
            Arc::clone(&translator),
        ));
        let webhook = PaymentWebhookUseCase::new(Arc::clone(&payments), Arc::clone(&reconciliation));
        let intake = OrderIntakeUseCase::new(Arc::clone(&requests), Arc::clone(&issuer), queue_orders);

        Self {
            ledger,
            gateway,
            publisher,
            translator,
            payments,
            requests,
            reconciliation,
            issuer,
            webhook,
            intake,
        }
    }

    pub fn poller(&self) -> PendingInvoicePoller {
        PendingInvoicePoller {
            payment_repository: Arc::clone(&self.payments),
            payment_gateway: self.gateway.clone(),
            reconciliation: Arc::clone(&self.reconciliation),
            status_translator: Arc::clone(&self.translator),
        }
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use rust_decimal::Decimal;

use crate::domain::entities::{
    failed_events::InsertFailedEventEntity,
    payment_anomalies::InsertPaymentAnomalyEntity,
    payments::{InsertPaymentEntity, PaymentEntity},
};

/// Ledger access for payments, anomalies and dead-letter rows. Status
/// arguments are catalog codes.
#[automock]
#[async_trait]
pub trait PaymentRepository {
    /// Opens a transaction scope. Nothing written through it is visible
    /// until `commit`; dropping it uncommitted rolls back.
    async fn begin_transaction(&self) -> Result<Box<dyn PaymentLedgerTransaction>>;

    async fn is_already_paid(&self, order_id: i64, paid_status: i64) -> Result<bool>;

    async fn find_payment_by_order_id(&self, order_id: i64) -> Result<Option<PaymentEntity>>;

    /// Fails when the order has no payment row.
    async fn get_payment_amount_by_order_id(&self, order_id: i64) -> Result<Decimal>;

    /// `None` when the order already has a payment row. Orders are unique
    /// in the ledger, so a concurrent insert for the same order loses here.
    async fn save_payment(&self, payment: InsertPaymentEntity) -> Result<Option<i64>>;

    /// Oldest first.
    async fn list_payments_by_status(&self, status: i64) -> Result<Vec<PaymentEntity>>;

    /// Payments in `status` whose expiry is before `cutoff`, oldest first.
    async fn list_payments_expired_before(
        &self,
        status: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PaymentEntity>>;

    /// Conditional write: moves the payment to `to` only while it is still in
    /// `from`. Returns whether a row changed.
    async fn transition_status(&self, payment_id: i64, from: i64, to: i64) -> Result<bool>;

    async fn save_payment_anomaly(&self, anomaly: InsertPaymentAnomalyEntity) -> Result<i64>;
}

#[automock]
pub trait PaymentLedgerTransaction: Send {
    /// Sets the status of the order's payment unless it already holds
    /// `unless_status`. Returns the number of rows changed.
    fn update_status(&mut self, order_id: i64, status: i64, unless_status: i64) -> Result<usize>;

    fn save_failed_event(&mut self, event: InsertFailedEventEntity) -> Result<i64>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;
}

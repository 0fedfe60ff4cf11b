use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::payment_requests::{
    InsertPaymentRequestEntity, PaymentRequestEntity,
};

#[automock]
#[async_trait]
pub trait PaymentRequestRepository {
    async fn save_payment_request(&self, request: InsertPaymentRequestEntity) -> Result<i64>;

    /// Pending requests, oldest first.
    async fn list_pending_payment_requests(&self) -> Result<Vec<PaymentRequestEntity>>;

    /// Failed requests with `retry_count < max_retries`, oldest first.
    async fn list_retryable_failed_payment_requests(
        &self,
        max_retries: i32,
    ) -> Result<Vec<PaymentRequestEntity>>;

    async fn mark_success(&self, request_id: i64) -> Result<()>;

    /// Marks the request failed, stores `notes` and bumps `retry_count`.
    async fn mark_failed(&self, request_id: i64, notes: String) -> Result<()>;

    async fn reset_to_pending(&self, request_id: i64) -> Result<()>;
}

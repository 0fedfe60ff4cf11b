use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

/// One publish attempt per call; retries are the caller's business.
#[automock]
#[async_trait]
pub trait PaymentEventPublisher {
    async fn publish_payment_success(&self, order_id: i64) -> Result<()>;
}

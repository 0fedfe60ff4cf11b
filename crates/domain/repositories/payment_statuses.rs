use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::payment_statuses::PaymentStatusEntity;

#[automock]
#[async_trait]
pub trait PaymentStatusCatalogRepository {
    async fn list_statuses(&self) -> Result<Vec<PaymentStatusEntity>>;
}

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::invoices::{InvoiceDetail, InvoiceRequest};

#[automock]
#[async_trait]
pub trait PaymentGateway {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<InvoiceDetail>;

    /// Current gateway status name of the invoice behind `external_id`.
    async fn check_invoice_status(&self, external_id: String) -> Result<String>;
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const WEBHOOK_STATUS_PAID: &str = "PAID";

// Invoice callback from the payment gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentWebhook {
    pub status: String,
    pub external_id: String,
    pub amount: Decimal,
}

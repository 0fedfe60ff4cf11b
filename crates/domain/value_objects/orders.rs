use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderCreatedEvent {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub payer_email: String,
    #[serde(default)]
    pub shipping_address: String,
}

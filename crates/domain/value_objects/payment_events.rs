use serde::{Deserialize, Serialize};

use super::external_ids::external_id_for_order;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentSuccessEvent {
    pub order_id: i64,
    pub status: String,
}

impl PaymentSuccessEvent {
    pub fn paid(order_id: i64) -> Self {
        Self {
            order_id,
            status: "paid".to_string(),
        }
    }

    /// Partition key on the bus; keeps events of one order in order.
    pub fn key(&self) -> String {
        external_id_for_order(self.order_id)
    }
}

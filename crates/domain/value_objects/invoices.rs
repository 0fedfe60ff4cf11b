use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceRequest {
    pub external_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
}

impl InvoiceRequest {
    pub fn for_order(order_id: i64, amount: Decimal, payer_email: Option<String>) -> Self {
        Self {
            external_id: super::external_ids::external_id_for_order(order_id),
            amount,
            description: format!("Payment for order {order_id}"),
            payer_email: payer_email.filter(|email| !email.trim().is_empty()),
        }
    }
}

/// Invoice as reported by the gateway. Only the fields this service reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceDetail {
    pub id: String,
    pub external_id: String,
    pub status: String,
    #[serde(default)]
    pub invoice_url: Option<String>,
    pub expiry_date: DateTime<Utc>,
}

impl InvoiceDetail {
    /// `PAID` and `SETTLED` both mean the payer's money arrived.
    pub fn is_paid_status(status: &str) -> bool {
        status.eq_ignore_ascii_case("PAID") || status.eq_ignore_ascii_case("SETTLED")
    }
}

pub mod order_intake;
pub mod payment_reconciliation;
pub mod payment_webhook;

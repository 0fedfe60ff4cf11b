pub mod order_created;
pub mod payment_webhook;

pub mod enums;
pub mod external_ids;
pub mod invoices;
pub mod orders;
pub mod payment_events;
pub mod webhooks;

pub mod payment_events;
pub mod payment_gateway;
pub mod payment_requests;
pub mod payment_statuses;
pub mod payments;

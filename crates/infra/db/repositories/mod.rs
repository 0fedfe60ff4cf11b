pub mod payment_requests;
pub mod payment_statuses;
pub mod payments;

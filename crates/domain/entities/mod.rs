pub mod failed_events;
pub mod payment_anomalies;
pub mod payment_requests;
pub mod payment_statuses;
pub mod payments;

pub mod anomaly_types;
pub mod failed_event_types;
pub mod payment_request_statuses;
pub mod payment_statuses;
pub mod review_statuses;

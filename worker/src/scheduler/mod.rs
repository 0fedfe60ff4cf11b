//! The four reconciliation loops. Each owns its own timer and talks to the
//! others only through the ledger, so they can run and restart independently.

pub mod expiry_sweep;
pub mod failed_request_retry;
pub mod invoice_creation;
pub mod pending_invoice_polling;

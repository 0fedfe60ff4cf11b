pub mod invoice_issuer;
pub mod publish_retry;
pub mod status_translator;

use std::time::Duration;

use url::Url;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub worker_server: WorkerServer,
    pub database: Database,
    pub payment_gateway: PaymentGateway,
    pub event_bus: EventBus,
    pub order_intake: OrderIntake,
    pub scheduler: Scheduler,
    pub publish_retry: PublishRetry,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PaymentGateway {
    pub base_url: Url,
    pub api_key: String,
    pub webhook_token: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    pub publish_url: Url,
    pub payment_success_topic: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OrderIntake {
    /// Unset disables the internal order-created endpoint.
    pub internal_token: Option<String>,
    pub disable_create_invoice_directly: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    pub invoice_creation_interval: Duration,
    pub pending_invoice_poll_interval: Duration,
    pub failed_request_retry_interval: Duration,
    pub expiry_sweep_interval: Duration,
    pub max_request_retries: i32,
}

#[derive(Debug, Clone)]
pub struct PublishRetry {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

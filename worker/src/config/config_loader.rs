use std::str::FromStr;
use std::time::Duration;

use super::config_model::{
    Database, DotEnvyConfig, EventBus, OrderIntake, PaymentGateway, PublishRetry, Scheduler,
    WorkerServer,
};
use crate::config::stage::Stage;
use anyhow::{Context, Result, bail};
use url::Url;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let env = EnvReader { lookup };

    let worker_server = WorkerServer {
        port: env.required_parsed("SERVER_PORT_WORKER")?,
        body_limit: env.parsed_or("SERVER_BODY_LIMIT", 1)?,
        timeout: env.parsed_or("SERVER_TIMEOUT", 10)?,
    };

    let database = Database {
        url: env.required("DATABASE_URL")?,
    };

    let payment_gateway = PaymentGateway {
        base_url: env.url_or("PAYMENT_GATEWAY_BASE_URL", "https://api.xendit.co")?,
        api_key: env.required("PAYMENT_GATEWAY_API_KEY")?,
        webhook_token: env.required("PAYMENT_GATEWAY_WEBHOOK_TOKEN")?,
        timeout: Duration::from_secs(env.parsed_or("PAYMENT_GATEWAY_TIMEOUT_SECS", 5)?),
    };

    let event_bus = EventBus {
        publish_url: Url::parse(&env.required("EVENT_BUS_PUBLISH_URL")?)
            .context("EVENT_BUS_PUBLISH_URL is invalid")?,
        payment_success_topic: env
            .optional("EVENT_BUS_PAYMENT_SUCCESS_TOPIC")
            .unwrap_or_else(|| "payment.success".to_string()),
        timeout: Duration::from_secs(env.parsed_or("EVENT_BUS_TIMEOUT_SECS", 5)?),
    };

    let order_intake = OrderIntake {
        internal_token: env.optional("INTERNAL_ORDER_TOKEN"),
        disable_create_invoice_directly: env
            .parsed_or("DISABLE_CREATE_PAYMENT_INVOICE_DIRECTLY", false)?,
    };

    let scheduler = Scheduler {
        invoice_creation_interval: Duration::from_secs(
            env.parsed_or("INVOICE_CREATION_INTERVAL_SECS", 5)?,
        ),
        pending_invoice_poll_interval: Duration::from_secs(
            env.parsed_or("PENDING_INVOICE_POLL_INTERVAL_SECS", 600)?,
        ),
        failed_request_retry_interval: Duration::from_secs(
            env.parsed_or("FAILED_REQUEST_RETRY_INTERVAL_SECS", 5)?,
        ),
        expiry_sweep_interval: Duration::from_secs(
            env.parsed_or("EXPIRY_SWEEP_INTERVAL_SECS", 10)?,
        ),
        max_request_retries: env.parsed_or("PAYMENT_REQUEST_MAX_RETRIES", 3)?,
    };

    let publish_retry = PublishRetry {
        max_attempts: env.parsed_or("PUBLISH_MAX_ATTEMPTS", 5)?,
        backoff_base: Duration::from_millis(env.parsed_or("PUBLISH_BACKOFF_BASE_MS", 200)?),
        backoff_max: Duration::from_millis(env.parsed_or("PUBLISH_BACKOFF_MAX_MS", 3000)?),
    };

    if publish_retry.max_attempts == 0 {
        bail!("PUBLISH_MAX_ATTEMPTS must be at least 1");
    }
    if scheduler.max_request_retries < 0 {
        bail!("PAYMENT_REQUEST_MAX_RETRIES must not be negative");
    }

    let stage = env
        .optional("STAGE")
        .and_then(|stage| Stage::try_from(&stage).ok())
        .unwrap_or_default();

    Ok(DotEnvyConfig {
        stage,
        worker_server,
        database,
        payment_gateway,
        event_bus,
        order_intake,
        scheduler,
        publish_retry,
    })
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    /// Trimmed value; blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).and_then(|v| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        })
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .with_context(|| format!("{key} is invalid"))
    }

    fn required_parsed<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.required(key)?
            .parse()
            .with_context(|| format!("{key} is invalid"))
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().with_context(|| format!("{key} is invalid")),
            None => Ok(default),
        }
    }

    fn url_or(&self, key: &str, default: &str) -> Result<Url> {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        Url::parse(&raw).with_context(|| format!("{key} is invalid"))
    }
}

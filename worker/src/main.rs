use anyhow::Result;
use crates::domain::repositories::{
    payment_events::PaymentEventPublisher, payment_gateway::PaymentGateway,
    payment_requests::PaymentRequestRepository, payments::PaymentRepository,
};
use crates::infra::{
    db::{
        postgres::postgres_connection,
        repositories::{
            payment_requests::PaymentRequestPostgres, payment_statuses::PaymentStatusCatalogPostgres,
            payments::PaymentPostgres,
        },
    },
    messaging::http_event_publisher::HttpEventBusPublisher,
};
use crates::payments::invoice_gateway_client::InvoiceGatewayClient;
use payment_worker::{
    axum_http, config,
    scheduler::{
        expiry_sweep, failed_request_retry, invoice_creation,
        pending_invoice_polling::{self, PendingInvoicePoller},
    },
    services::{
        invoice_issuer::InvoiceIssuer, publish_retry::PublishRetryPolicy,
        status_translator::StatusTranslator,
    },
    usecases::{
        order_intake::OrderIntakeUseCase, payment_reconciliation::PaymentReconciliationUseCase,
        payment_webhook::PaymentWebhookUseCase,
    },
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Payment worker exited with error: {:#}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("payment-worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    // Status catalog is read once; a broken catalog stops startup here.
    let status_catalog = PaymentStatusCatalogPostgres::new(Arc::clone(&db_pool_arc));
    let status_translator = Arc::new(StatusTranslator::load(&status_catalog).await?);

    let payment_repository: Arc<dyn PaymentRepository + Send + Sync> =
        Arc::new(PaymentPostgres::new(Arc::clone(&db_pool_arc)));
    let payment_request_repository: Arc<dyn PaymentRequestRepository + Send + Sync> =
        Arc::new(PaymentRequestPostgres::new(Arc::clone(&db_pool_arc)));

    let gateway_config = &dotenvy_env.payment_gateway;
    let payment_gateway: Arc<dyn PaymentGateway + Send + Sync> =
        Arc::new(InvoiceGatewayClient::new(
            gateway_config.base_url.clone(),
            gateway_config.api_key.clone(),
            gateway_config.timeout,
        )?);

    let event_bus_config = &dotenvy_env.event_bus;
    let event_publisher: Arc<dyn PaymentEventPublisher + Send + Sync> =
        Arc::new(HttpEventBusPublisher::new(
            event_bus_config.publish_url.clone(),
            event_bus_config.payment_success_topic.clone(),
            event_bus_config.timeout,
        )?);

    let retry_config = &dotenvy_env.publish_retry;
    let reconciliation_usecase = Arc::new(PaymentReconciliationUseCase::new(
        Arc::clone(&payment_repository),
        Arc::clone(&event_publisher),
        Arc::clone(&status_translator),
        PublishRetryPolicy {
            max_attempts: retry_config.max_attempts,
            base_delay: retry_config.backoff_base,
            max_delay: retry_config.backoff_max,
        },
    ));

    let invoice_issuer = Arc::new(InvoiceIssuer::new(
        Arc::clone(&payment_repository),
        Arc::clone(&payment_gateway),
        Arc::clone(&status_translator),
    ));

    let webhook_usecase = Arc::new(PaymentWebhookUseCase::new(
        Arc::clone(&payment_repository),
        Arc::clone(&reconciliation_usecase),
    ));

    let order_intake_usecase = Arc::new(OrderIntakeUseCase::new(
        Arc::clone(&payment_request_repository),
        Arc::clone(&invoice_issuer),
        dotenvy_env.order_intake.disable_create_invoice_directly,
    ));

    let schedule = dotenvy_env.scheduler.clone();

    // Spawn background loops
    let invoice_creation_loop = tokio::spawn(invoice_creation::run(
        Arc::clone(&payment_request_repository),
        invoice_issuer,
        schedule.invoice_creation_interval,
    ));

    let pending_invoice_polling_loop = tokio::spawn(pending_invoice_polling::run(
        PendingInvoicePoller {
            payment_repository: Arc::clone(&payment_repository),
            payment_gateway,
            reconciliation: reconciliation_usecase,
            status_translator: Arc::clone(&status_translator),
        },
        schedule.pending_invoice_poll_interval,
    ));

    let failed_request_retry_loop = tokio::spawn(failed_request_retry::run(
        payment_request_repository,
        schedule.max_request_retries,
        schedule.failed_request_retry_interval,
    ));

    let expiry_sweep_loop = tokio::spawn(expiry_sweep::run(
        payment_repository,
        status_translator,
        schedule.expiry_sweep_interval,
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let http_server = tokio::spawn(async move {
        axum_http::http_serve::start(server_config, webhook_usecase, order_intake_usecase).await
    });

    info!("Payment worker started");

    tokio::select! {
        result = invoice_creation_loop => result??,
        result = pending_invoice_polling_loop => result??,
        result = failed_request_retry_loop => result??,
        result = expiry_sweep_loop => result??,
        result = http_server => result??,
    };
    Ok(())
}

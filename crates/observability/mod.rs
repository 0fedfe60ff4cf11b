mod alert_layer;
mod config;
mod discord;

use anyhow::Result;
use alert_layer::{AlertDispatcher, AlertLayer};
use config::ObservabilityConfig;
use discord::DiscordAlertSink;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber: RUST_LOG filtered fmt output plus the
/// optional Discord alert sink for dead-letters, anomalies and other errors.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let alert_layer = config.discord.as_ref().map(|discord| {
        let dispatcher = AlertDispatcher::spawn(vec![Arc::new(DiscordAlertSink::new(
            discord.webhook_url.clone(),
        ))]);

        AlertLayer::new(dispatcher, config.service_context.clone()).with_filter(
            tracing_subscriber::filter::LevelFilter::from_level(discord.min_level),
        )
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(
            service = %config.service_context.service_name,
            environment = %config.service_context.environment,
            component = %config.service_context.component,
            warning = %warning,
            "observability config warning"
        );
    }

    info!(
        service = %config.service_context.service_name,
        environment = %config.service_context.environment,
        component = %config.service_context.component,
        discord_alerts = config.discord.is_some(),
        "observability initialized"
    );

    Ok(())
}

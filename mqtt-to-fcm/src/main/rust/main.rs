use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use mqtt_to_fcm::domain::value_objects::routing_table::device_subscriptions;
use mqtt_to_fcm::shutdown::{forward_signal, wait_for_shutdown};
use mqtt_to_fcm::{
    serve_metrics, BridgeOptions, BridgeService, Config, CredentialProvider, EventRouter,
    MetricsReporter, MqttBusClient, PrometheusReporter, PushDispatcher, RoutingTable,
    ServiceAccountExchanger, ServiceAccountKey,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();
    config.validate()?;

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    // Initialize metrics
    PrometheusReporter::init_metrics()?;

    // Resolve layered settings
    let options = BridgeOptions::load(&config.options_file)?;
    let key = ServiceAccountKey::load(&config.service_account)?;
    let bridge_config = config
        .resolve(&options, |name| std::env::var(name).ok())
        .context("Invalid bridge configuration")?;
    let backoff_policy = config
        .to_backoff_policy()
        .context("Invalid reconnect settings")?;

    info!("Starting MQTT to FCM bridge");
    info!(
        "  Broker:    {}:{}",
        bridge_config.broker_host(),
        bridge_config.broker_port()
    );
    info!("  System id: {}", bridge_config.system_id());
    info!("  FCM topic: {}", bridge_config.target_topic());
    info!("  Project:   {}", key.project_id);
    info!("  Metrics port: {}", config.metrics_port);

    // Create infrastructure implementations (dependency injection)
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let metrics: Arc<dyn MetricsReporter> = Arc::new(PrometheusReporter::new());

    let exchanger = ServiceAccountExchanger::new(http.clone(), &key)?;
    let credentials = Arc::new(CredentialProvider::new(
        Arc::new(exchanger),
        config.token_refresh_margin(),
        Arc::clone(&metrics),
    ));
    let dispatcher = Arc::new(PushDispatcher::new(
        http,
        &config.gateway_url,
        &key.project_id,
        credentials,
    ));

    let router = EventRouter::new(
        RoutingTable::for_system(bridge_config.system_id()),
        bridge_config.target_topic().to_string(),
        dispatcher,
        Arc::clone(&metrics),
    )
    .with_max_in_flight(config.max_in_flight);

    let bus = Box::new(MqttBusClient::new(&bridge_config, backoff_policy));

    // Create application service
    let mut bridge_service = BridgeService::new(
        bus,
        router,
        device_subscriptions(bridge_config.system_id()),
        metrics,
    );

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        forward_signal(tokio::signal::ctrl_c(), &signal_tx).await;
    });

    // Start metrics server
    let (addr, server) = serve_metrics(config.metrics_port, wait_for_shutdown(shutdown_rx.clone()))
        .context("Failed to bind metrics server")?;
    info!("Metrics server listening on http://{}", addr);
    let metrics_server = tokio::spawn(server);

    // Run bridge until Ctrl+C or the bus closes
    let result = bridge_service.run(wait_for_shutdown(shutdown_rx)).await;

    // Signal shutdown to metrics server and wait for it
    let _ = shutdown_tx.send(true);
    metrics_server.await?;

    if let Err(e) = result {
        error!("Bridge error: {}", e);
        return Err(e.into());
    }

    info!("Bridge shutdown complete");
    Ok(())
}

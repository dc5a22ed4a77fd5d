use log::{error, info, warn};
use std::io;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use health_ble_bridge::bluetooth::run_scanner;
use health_ble_bridge::config::BridgeConfig;
use health_ble_bridge::models::RawCharacteristicPayload;
use health_ble_bridge::publish::{BrokerHandle, ExternalBroker, LineSink, Publication, ReadingSink};
use health_ble_bridge::utils::format_datetime;
use health_ble_bridge::ReadingAssembler;

async fn main_loop(
    config: Arc<BridgeConfig>,
    broker: Arc<dyn BrokerHandle>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Starting health data bridge at: {}",
        format_datetime(&OffsetDateTime::now_utc())
    );

    let (tx, mut rx) = mpsc::channel::<RawCharacteristicPayload>(config.channel_capacity);

    let scanner_config = Arc::clone(&config);
    let scanner = tokio::spawn(async move {
        if let Err(e) = run_scanner(scanner_config, tx).await {
            error!("Scanner failed: {}", e);
        }
    });

    let assembler = ReadingAssembler::from_config(&config);
    let mut sink = LineSink::new(io::stdout(), broker);

    // Channel closes once the scanner task is gone
    while let Some(payload) = rx.recv().await {
        let records = match assembler.assemble(&payload) {
            Ok(records) => records,
            Err(e) => {
                warn!("Dropping frame from {}: {}", payload.device_address, e);
                continue;
            }
        };

        for record in &records {
            let publication = Publication::from_record(record, &config.default_user);
            if let Err(e) = sink.publish(&publication) {
                error!("Failed to publish to {}: {}", publication.topic, e);
            }
        }
    }

    scanner.await?;
    Err("BLE scanner stopped".into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match BridgeConfig::new() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let broker: Arc<dyn BrokerHandle> = Arc::new(ExternalBroker::new(config.broker_url.clone()));
    if let Err(e) = broker.start() {
        error!("Broker address rejected: {}", e);
        return Err(e.into());
    }

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            // Keep the sender alive so the main loop is not cancelled
            std::future::pending::<()>().await;
        }
        let _ = tx.send(());
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config, Arc::clone(&broker)) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    broker.stop();
    Ok(())
}

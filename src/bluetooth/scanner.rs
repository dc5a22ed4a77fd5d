/// Bluetooth Low Energy discovery and GATT notification forwarding
use bluer::gatt::remote::Characteristic;
use bluer::{Adapter, Device};
use futures_util::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::config::BridgeConfig;
use crate::models::{CharacteristicKind, RawCharacteristicPayload};

type ScanError = Box<dyn std::error::Error + Send + Sync>;

const SERVICE_RESOLVE_ATTEMPTS: u32 = 10;
const SERVICE_RESOLVE_INTERVAL_MS: u64 = 500;

/// Scan for the configured devices and forward their notifications
///
/// Runs discovery windows back to back. Each configured device found in a
/// window is connected and its known measurement characteristics are
/// subscribed; a device whose forwarding task ended (disconnect, power off)
/// is picked up again in a later window. Returns when the receiving side of
/// `tx` is closed.
pub async fn run_scanner(
    config: Arc<BridgeConfig>,
    tx: mpsc::Sender<RawCharacteristicPayload>,
) -> Result<(), ScanError> {
    // Initialize Bluetooth session
    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create Bluetooth session: {}", e);
            return Err(e.into());
        }
    };

    // Get the default Bluetooth adapter
    let adapter = match session.default_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to get default Bluetooth adapter: {}", e);
            return Err(e.into());
        }
    };

    // Ensure Bluetooth adapter is powered on
    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    // Configure discovery filter for Low Energy devices only
    let filter = bluer::DiscoveryFilter {
        transport: bluer::DiscoveryTransport::Le,
        duplicate_data: false,
        ..Default::default()
    };

    if let Err(e) = adapter.set_discovery_filter(filter).await {
        warn!("Failed to set discovery filter: {}", e);
    }

    let mut subscriptions: HashMap<String, JoinHandle<()>> = HashMap::new();

    while !tx.is_closed() {
        subscriptions.retain(|addr, handle| {
            if handle.is_finished() {
                info!("Lost connection to {}", addr);
                false
            } else {
                true
            }
        });

        if let Err(e) = discover(&adapter, config.scan_duration_secs).await {
            error!("Discovery failed: {}", e);
            sleep(Duration::from_secs(config.scan_duration_secs)).await;
            continue;
        }

        let addresses = match adapter.device_addresses().await {
            Ok(addresses) => addresses,
            Err(e) => {
                error!("Failed to get device addresses: {}", e);
                continue;
            }
        };

        for addr in addresses {
            let addr_str = addr.to_string().to_uppercase();

            // Only connect to devices that are in our configuration
            if !config.devices.contains_key(&addr_str) || subscriptions.contains_key(&addr_str) {
                continue;
            }

            let device = match adapter.device(addr) {
                Ok(device) => device,
                Err(_) => continue,
            };

            match subscribe(&device).await {
                Ok(characteristics) if characteristics.is_empty() => {
                    warn!("{} exposes no known measurement characteristic", addr_str);
                }
                Ok(characteristics) => {
                    info!(
                        "Subscribed to {} characteristic(s) on {} ({})",
                        characteristics.len(),
                        config.device_name(&addr_str),
                        addr_str
                    );
                    let handle = tokio::spawn(forward(addr_str.clone(), characteristics, tx.clone()));
                    subscriptions.insert(addr_str, handle);
                }
                Err(e) => warn!("Failed to subscribe to {}: {}", addr_str, e),
            }
        }
    }

    for handle in subscriptions.into_values() {
        handle.abort();
    }
    info!("Scanner stopped");
    Ok(())
}

/// Let discovery run for one window
async fn discover(adapter: &Adapter, duration_secs: u64) -> Result<(), ScanError> {
    let discovery_stream = adapter.discover_devices().await?;
    let discovery_handle = tokio::spawn(async move {
        let mut stream = discovery_stream;
        while let Some(event) = stream.next().await {
            debug!("Discovery event: {:?}", event);
        }
    });

    sleep(Duration::from_secs(duration_secs)).await;

    // Stop discovery
    discovery_handle.abort();
    Ok(())
}

/// Connect and collect the characteristics this bridge knows how to decode
async fn subscribe(
    device: &Device,
) -> Result<Vec<(CharacteristicKind, Characteristic)>, ScanError> {
    if !device.is_connected().await? {
        device.connect().await?;
    }

    let mut attempts = 0;
    while !device.is_services_resolved().await? {
        attempts += 1;
        if attempts >= SERVICE_RESOLVE_ATTEMPTS {
            return Err(format!("services of {} not resolved", device.address()).into());
        }
        sleep(Duration::from_millis(SERVICE_RESOLVE_INTERVAL_MS)).await;
    }

    let mut found = Vec::new();
    for service in device.services().await? {
        for characteristic in service.characteristics().await? {
            let uuid = characteristic.uuid().await?;
            if let Some(kind) = CharacteristicKind::from_uuid(uuid.as_u128()) {
                debug!("{}: found {} characteristic {}", device.address(), kind.label(), uuid);
                found.push((kind, characteristic));
            }
        }
    }

    Ok(found)
}

/// Push every notification of one device into the channel until it goes away
async fn forward(
    address: String,
    characteristics: Vec<(CharacteristicKind, Characteristic)>,
    tx: mpsc::Sender<RawCharacteristicPayload>,
) {
    let mut streams = Vec::with_capacity(characteristics.len());
    for (kind, characteristic) in characteristics {
        match characteristic.notify().await {
            Ok(notifications) => {
                streams.push(notifications.map(move |bytes| (kind, bytes)).boxed());
            }
            Err(e) => warn!("{}: cannot enable {} notifications: {}", address, kind.label(), e),
        }
    }

    let mut notifications = stream::select_all(streams);
    while let Some((kind, bytes)) = notifications.next().await {
        debug!("{}: {} notification {:02x?}", address, kind.label(), bytes);
        let payload = RawCharacteristicPayload {
            device_address: address.clone(),
            kind,
            bytes,
            received_at: OffsetDateTime::now_utc(),
        };
        if tx.send(payload).await.is_err() {
            debug!("Receiver closed, stopping notifications from {}", address);
            return;
        }
    }
}

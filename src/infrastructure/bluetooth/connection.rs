//! BLE Connection Module
//!
//! Handles device discovery, connection and GATT characteristic lookup.

use crate::infrastructure::bluetooth::profile;
use anyhow::{Context, Result};
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for connection behavior
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Device address, e.g. `D6:AF:43:58:57:9F`.
    pub address: String,
    /// How long to scan before giving up.
    pub scan_timeout: Duration,
    /// Optional report interval written to the sensor period
    /// characteristics after connecting.
    pub sensor_period_ms: Option<u16>,
}

/// The bridge characteristics found on the connected device.
///
/// micro:bit firmware only exposes the services it was built with, so
/// every entry is optional; absent sensors are skipped at subscribe time
/// and absent LED characteristics turn the matching commands into no-ops.
#[derive(Debug, Clone, Default)]
pub struct DeviceCharacteristics {
    pub button_a: Option<Characteristic>,
    pub button_b: Option<Characteristic>,
    pub accelerometer: Option<Characteristic>,
    pub accelerometer_period: Option<Characteristic>,
    pub magnetometer: Option<Characteristic>,
    pub magnetometer_period: Option<Characteristic>,
    pub magnetometer_bearing: Option<Characteristic>,
    pub temperature: Option<Characteristic>,
    pub temperature_period: Option<Characteristic>,
    pub led_text: Option<Characteristic>,
    pub led_matrix: Option<Characteristic>,
}

impl DeviceCharacteristics {
    pub fn from_discovered(discovered: &BTreeSet<Characteristic>) -> Self {
        let find = |service, uuid| {
            discovered
                .iter()
                .find(|c| c.service_uuid == service && c.uuid == uuid)
                .cloned()
        };
        Self {
            button_a: find(profile::BUTTON_SERVICE, profile::BUTTON_A_STATE),
            button_b: find(profile::BUTTON_SERVICE, profile::BUTTON_B_STATE),
            accelerometer: find(profile::ACCELEROMETER_SERVICE, profile::ACCELEROMETER_DATA),
            accelerometer_period: find(
                profile::ACCELEROMETER_SERVICE,
                profile::ACCELEROMETER_PERIOD,
            ),
            magnetometer: find(profile::MAGNETOMETER_SERVICE, profile::MAGNETOMETER_DATA),
            magnetometer_period: find(profile::MAGNETOMETER_SERVICE, profile::MAGNETOMETER_PERIOD),
            magnetometer_bearing: find(
                profile::MAGNETOMETER_SERVICE,
                profile::MAGNETOMETER_BEARING,
            ),
            temperature: find(profile::TEMPERATURE_SERVICE, profile::TEMPERATURE_DATA),
            temperature_period: find(profile::TEMPERATURE_SERVICE, profile::TEMPERATURE_PERIOD),
            led_text: find(profile::LED_SERVICE, profile::LED_TEXT),
            led_matrix: find(profile::LED_SERVICE, profile::LED_MATRIX_STATE),
        }
    }

    /// The telemetry characteristics to subscribe, with names for logging.
    pub fn telemetry_set(&self) -> Vec<(&'static str, &Characteristic)> {
        [
            ("button A", self.button_a.as_ref()),
            ("button B", self.button_b.as_ref()),
            ("accelerometer", self.accelerometer.as_ref()),
            ("magnetometer", self.magnetometer.as_ref()),
            ("magnetometer bearing", self.magnetometer_bearing.as_ref()),
            ("temperature", self.temperature.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, c)| c.map(|c| (name, c)))
        .collect()
    }
}

/// Result of a successful connection
pub struct ConnectionResult {
    pub peripheral: Peripheral,
    pub characteristics: DeviceCharacteristics,
}

/// BLE Connection handler
pub struct BleConnection {
    config: ConnectionConfig,
}

impl BleConnection {
    /// Create a new connection handler
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Connect to the configured device address
    pub async fn connect(&self) -> Result<ConnectionResult> {
        info!("Connecting to device: {}", self.config.address);

        // Step 1: Grab the first Bluetooth adapter
        let adapter = default_adapter().await?;

        // Step 2: Scan until the target address shows up
        let peripheral = self.find_peripheral(&adapter).await?;

        // Step 3: Connect and discover GATT services
        peripheral
            .connect()
            .await
            .with_context(|| format!("connecting to {}", self.config.address))?;
        info!("Device connected");

        peripheral
            .discover_services()
            .await
            .context("discovering GATT services")?;

        // Step 4: Map the profile characteristics
        let characteristics = DeviceCharacteristics::from_discovered(&peripheral.characteristics());
        for (name, present) in [
            ("button A", characteristics.button_a.is_some()),
            ("button B", characteristics.button_b.is_some()),
            ("accelerometer", characteristics.accelerometer.is_some()),
            ("magnetometer", characteristics.magnetometer.is_some()),
            ("bearing", characteristics.magnetometer_bearing.is_some()),
            ("temperature", characteristics.temperature.is_some()),
            ("LED text", characteristics.led_text.is_some()),
            ("LED matrix", characteristics.led_matrix.is_some()),
        ] {
            if present {
                info!("Found {} characteristic", name);
            } else {
                warn!("{} characteristic not present on this device", name);
            }
        }

        Ok(ConnectionResult {
            peripheral,
            characteristics,
        })
    }

    /// Scan for the peripheral with the configured address.
    async fn find_peripheral(&self, adapter: &Adapter) -> Result<Peripheral> {
        adapter
            .start_scan(ScanFilter::default())
            .await
            .context("starting BLE scan")?;

        let deadline = tokio::time::Instant::now() + self.config.scan_timeout;
        let found = 'scan: loop {
            for peripheral in adapter.peripherals().await? {
                if peripheral
                    .address()
                    .to_string()
                    .eq_ignore_ascii_case(&self.config.address)
                {
                    break 'scan Some(peripheral);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                break None;
            }
            sleep(Duration::from_millis(500)).await;
        };

        let _ = adapter.stop_scan().await;

        found.ok_or_else(|| {
            anyhow::anyhow!(
                "device {} not found within {:?}",
                self.config.address,
                self.config.scan_timeout
            )
        })
    }
}

/// Grab the first available Bluetooth adapter.
async fn default_adapter() -> Result<Adapter> {
    let manager = Manager::new().await.context("initializing BLE manager")?;
    manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no Bluetooth adapter found"))
}

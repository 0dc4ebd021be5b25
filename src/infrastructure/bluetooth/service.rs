//! Bridge Service Module
//!
//! Coordinator that connects to the device, applies the configured
//! sensor period, then runs the telemetry and dispatch loops side by
//! side until the device goes away.

use crate::domain::commands::CommandQueue;
use crate::domain::state::DeviceState;
use crate::infrastructure::bluetooth::connection::{
    BleConnection, ConnectionConfig, ConnectionResult,
};
use crate::infrastructure::bluetooth::dispatcher::{CommandDispatcher, DeviceLink};
use crate::infrastructure::bluetooth::telemetry;
use anyhow::Result;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the BLE side of the bridge for one device connection.
pub struct BridgeService {
    config: ConnectionConfig,
    state: Arc<DeviceState>,
    queue: Arc<CommandQueue>,
}

impl BridgeService {
    pub fn new(
        config: ConnectionConfig,
        state: Arc<DeviceState>,
        queue: Arc<CommandQueue>,
    ) -> Self {
        Self {
            config,
            state,
            queue,
        }
    }

    /// Connect, subscribe, dispatch. Returns when the device disconnects
    /// or a connection-phase step fails.
    pub async fn run(&self) -> Result<()> {
        let connection = BleConnection::new(self.config.clone());
        let ConnectionResult {
            peripheral,
            characteristics,
        } = connection.connect().await?;

        if let Some(period) = self.config.sensor_period_ms {
            apply_sensor_period(&peripheral, period, &characteristics.accelerometer_period).await;
            apply_sensor_period(&peripheral, period, &characteristics.magnetometer_period).await;
            apply_sensor_period(&peripheral, period, &characteristics.temperature_period).await;
        }

        self.state.set_connected(true);

        let dispatcher = CommandDispatcher::with_link(
            self.queue.clone(),
            DeviceLink {
                peripheral: peripheral.clone(),
                led_text: characteristics.led_text.clone(),
                led_matrix: characteristics.led_matrix.clone(),
            },
        );

        // The dispatch loop never ends on its own; the select resolves
        // when the notification stream closes.
        let result = tokio::select! {
            result = telemetry::run(&peripheral, &characteristics, &self.state) => result,
            _ = dispatcher.run() => Ok(()),
        };

        self.state.set_connected(false);
        warn!("Device connection ended");

        if let Err(err) = peripheral.disconnect().await {
            info!(%err, "disconnect after session end failed");
        }

        result
    }
}

/// Best-effort write of a report interval characteristic.
async fn apply_sensor_period(
    peripheral: &Peripheral,
    period_ms: u16,
    characteristic: &Option<Characteristic>,
) {
    let Some(characteristic) = characteristic else {
        return;
    };
    match peripheral
        .write(
            characteristic,
            &period_ms.to_le_bytes(),
            WriteType::WithResponse,
        )
        .await
    {
        Ok(()) => info!(period_ms, "sensor period applied"),
        Err(err) => warn!(%err, "failed to set sensor period"),
    }
}

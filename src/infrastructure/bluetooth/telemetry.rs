//! Telemetry subscriber
//!
//! Subscribes the sensor characteristics and feeds decoded notifications
//! into [`DeviceState`]. A malformed payload is logged and dropped; the
//! loop only ends when the notification stream closes (disconnect).

use crate::domain::state::DeviceState;
use crate::infrastructure::bluetooth::codec;
use crate::infrastructure::bluetooth::connection::DeviceCharacteristics;
use crate::infrastructure::bluetooth::profile;
use anyhow::{Context, Result};
use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use futures::stream::StreamExt;
use tracing::{info, trace, warn};
use uuid::Uuid;

/// Subscribe the available sensor characteristics and pump notifications
/// into the shared state until the stream ends.
pub async fn run(
    peripheral: &Peripheral,
    characteristics: &DeviceCharacteristics,
    state: &DeviceState,
) -> Result<()> {
    for (name, characteristic) in characteristics.telemetry_set() {
        peripheral
            .subscribe(characteristic)
            .await
            .with_context(|| format!("subscribing to {name}"))?;
        info!("Subscribed to {name}");
    }

    let mut notifications = peripheral
        .notifications()
        .await
        .context("opening notification stream")?;

    while let Some(notification) = notifications.next().await {
        apply(state, notification.uuid, &notification.value);
    }

    info!("Notification stream ended");
    Ok(())
}

/// Decode one notification and store it. Decode failures are dropped
/// after a warning so a single bad payload cannot kill telemetry.
fn apply(state: &DeviceState, uuid: Uuid, payload: &[u8]) {
    let result = match uuid {
        u if u == profile::BUTTON_A_STATE => codec::uint8(payload).map(|v| state.set_button_a(v)),
        u if u == profile::BUTTON_B_STATE => codec::uint8(payload).map(|v| state.set_button_b(v)),
        u if u == profile::ACCELEROMETER_DATA => {
            codec::vector16_le(payload).map(|(x, y, z)| state.set_accelerometer(x, y, z))
        }
        u if u == profile::MAGNETOMETER_DATA => {
            codec::vector16_le(payload).map(|(x, y, z)| state.set_magnetometer(x, y, z))
        }
        u if u == profile::MAGNETOMETER_BEARING => {
            codec::uint16_le(payload).map(|v| state.set_bearing(v))
        }
        u if u == profile::TEMPERATURE_DATA => {
            codec::sint8(payload).map(|v| state.set_temperature(v))
        }
        _ => {
            trace!(%uuid, "notification for unhandled characteristic");
            Ok(())
        }
    };

    if let Err(err) = result {
        warn!(%uuid, %err, "dropping malformed notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerometer_notification_updates_state() {
        let state = DeviceState::new();
        let mut payload = Vec::new();
        payload.extend_from_slice(&250i16.to_le_bytes());
        payload.extend_from_slice(&(-250i16).to_le_bytes());
        payload.extend_from_slice(&(-1024i16).to_le_bytes());
        apply(&state, profile::ACCELEROMETER_DATA, &payload);
        assert_eq!(state.accelerometer(), (250, -250, -1024));
    }

    #[test]
    fn button_and_temperature_notifications() {
        let state = DeviceState::new();
        apply(&state, profile::BUTTON_A_STATE, &[1]);
        apply(&state, profile::BUTTON_B_STATE, &[2]);
        apply(&state, profile::TEMPERATURE_DATA, &[0xFB]);
        assert_eq!(state.button_a(), 1);
        assert_eq!(state.button_b(), 2);
        assert_eq!(state.temperature(), -5);
    }

    #[test]
    fn bearing_notification_is_little_endian() {
        let state = DeviceState::new();
        apply(&state, profile::MAGNETOMETER_BEARING, &[0x67, 0x01]);
        assert_eq!(state.bearing(), 359);
    }

    #[test]
    fn truncated_payload_leaves_state_untouched() {
        let state = DeviceState::new();
        state.set_accelerometer(7, 8, 9);
        apply(&state, profile::ACCELEROMETER_DATA, &[0x01, 0x02]);
        assert_eq!(state.accelerometer(), (7, 8, 9));
    }

    #[test]
    fn unknown_characteristic_is_ignored() {
        let state = DeviceState::new();
        apply(&state, uuid::uuid!("00002a00-0000-1000-8000-00805f9b34fb"), &[1, 2, 3]);
        assert_eq!(state.accelerometer(), (0, 0, 0));
    }
}

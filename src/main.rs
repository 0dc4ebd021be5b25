mod domain;
mod infrastructure;
mod server;

use crate::domain::blocks::BlockFacade;
use crate::domain::commands::CommandQueue;
use crate::domain::settings::SettingsService;
use crate::domain::state::DeviceState;
use crate::infrastructure::bluetooth::connection::ConnectionConfig;
use crate::infrastructure::bluetooth::BridgeService;
use crate::infrastructure::logging;
use crate::infrastructure::serial::{self, SerialConfig};
use crate::server::BlockServer;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "microbit_block_bridge",
    about = "Bridges a BBC micro:bit into a Scratch-like block environment"
)]
struct Cli {
    #[command(subcommand)]
    transport: Transport,
}

#[derive(Subcommand)]
enum Transport {
    /// Connect over Bluetooth Low Energy
    Ble {
        /// Device address, e.g. D6:AF:43:58:57:9F. Defaults to the last
        /// address this bridge connected to.
        address: Option<String>,
    },
    /// Read telemetry from a serial port
    Serial {
        /// Serial device path, e.g. /dev/ttyACM0
        #[arg(long)]
        port: Option<String>,
    },
    /// Forward stdin lines to the device over the serial port
    Scroll {
        /// Serial device path, e.g. /dev/ttyACM0
        #[arg(long)]
        port: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = SettingsService::new()?;
    let _logging_guard = logging::init_logger(&settings.get().log_settings)?;
    info!("Starting micro:bit block bridge");

    match cli.transport {
        Transport::Ble { address } => {
            let address = address
                .or_else(|| settings.get().last_ble_address.clone())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "no device address given and none remembered; run `ble <ADDRESS>` once"
                    )
                })?;
            settings.remember_address(&address)?;
            let config = ConnectionConfig {
                address,
                scan_timeout: Duration::from_secs(settings.get().scan_timeout_secs),
                sensor_period_ms: settings.get().sensor_period_ms,
            };
            run_ble(config, settings.get().server_port).await
        }
        Transport::Serial { port } => {
            let config = serial_config(&settings, port);
            run_serial(config, settings.get().server_port).await
        }
        Transport::Scroll { port } => {
            let config = serial_config(&settings, port);
            serial::run_scroll(&config).await
        }
    }
}

fn serial_config(settings: &SettingsService, port: Option<String>) -> SerialConfig {
    SerialConfig {
        path: port.unwrap_or_else(|| settings.get().serial_port.clone()),
        baud: settings.get().serial_baud,
    }
}

/// BLE bridge: block server plus the device session; whichever side
/// stops first ends the process.
async fn run_ble(config: ConnectionConfig, server_port: u16) -> Result<()> {
    let state = Arc::new(DeviceState::new());
    let queue = Arc::new(CommandQueue::new());
    let facade = Arc::new(BlockFacade::new(state.clone(), queue.clone()));

    let server = BlockServer::new(facade, server_port);
    let bridge = BridgeService::new(config, state, queue);

    tokio::select! {
        result = server.run() => result,
        result = bridge.run() => result,
    }
}

/// Serial bridge: block server plus the line reader. Commands still
/// enqueue but nothing drains them on this transport.
async fn run_serial(config: SerialConfig, server_port: u16) -> Result<()> {
    let state = Arc::new(DeviceState::new());
    let queue = Arc::new(CommandQueue::new());
    let facade = Arc::new(BlockFacade::new(state.clone(), queue.clone()));

    let server = BlockServer::new(facade, server_port);

    tokio::select! {
        result = server.run() => result,
        result = serial::run_telemetry(&config, &state) => result,
    }
}

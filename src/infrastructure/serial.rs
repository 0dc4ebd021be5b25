//! Serial transport
//!
//! The serial firmware variant prints one telemetry frame per line:
//! accelerometer X, Y, Z then the two button states, whitespace
//! separated. Wire settings are 115200 baud, 8 data bits, no parity,
//! one stop bit.

use crate::domain::state::DeviceState;
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub path: String,
    pub baud: u32,
}

fn open(config: &SerialConfig) -> Result<SerialStream> {
    tokio_serial::new(&config.path, config.baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .open_native_async()
        .with_context(|| format!("opening serial port {}", config.path))
}

/// One parsed telemetry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialFrame {
    pub acc: (i16, i16, i16),
    pub button_a: u8,
    pub button_b: u8,
}

/// Parse an `x y z a b` line. Anything with the wrong field count or a
/// non-numeric field is rejected.
pub fn parse_frame(line: &str) -> Option<SerialFrame> {
    let mut fields = line.split_whitespace();
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    let z = fields.next()?.parse().ok()?;
    let button_a = fields.next()?.parse().ok()?;
    let button_b = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(SerialFrame {
        acc: (x, y, z),
        button_a,
        button_b,
    })
}

/// Read telemetry frames into the shared state until the port closes.
pub async fn run_telemetry(config: &SerialConfig, state: &DeviceState) -> Result<()> {
    let port = open(config)?;
    info!("Reading telemetry from {} at {} baud", config.path, config.baud);
    state.set_connected(true);

    let mut lines = BufReader::new(port).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_frame(&line) {
            Some(frame) => {
                let (x, y, z) = frame.acc;
                state.set_accelerometer(x, y, z);
                state.set_button_a(frame.button_a);
                state.set_button_b(frame.button_b);
            }
            None => debug!(line = %line, "skipping malformed frame"),
        }
    }

    state.set_connected(false);
    Ok(())
}

/// Forward stdin lines to the device (the `scroll` subcommand).
pub async fn run_scroll(config: &SerialConfig) -> Result<()> {
    let mut port = open(config)?;
    info!("Forwarding stdin to {}; Ctrl-D ends", config.path);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Err(err) = port.write_all(line.as_bytes()).await {
            warn!(%err, "serial write failed");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_frame() {
        assert_eq!(
            parse_frame("250 -250 -1024 1 0"),
            Some(SerialFrame {
                acc: (250, -250, -1024),
                button_a: 1,
                button_b: 0,
            })
        );
    }

    #[test]
    fn tolerates_extra_whitespace() {
        assert_eq!(
            parse_frame("  0\t0   0  0 0 "),
            Some(SerialFrame {
                acc: (0, 0, 0),
                button_a: 0,
                button_b: 0,
            })
        );
    }

    #[test]
    fn rejects_short_and_long_frames() {
        assert_eq!(parse_frame("1 2 3 4"), None);
        assert_eq!(parse_frame("1 2 3 4 5 6"), None);
        assert_eq!(parse_frame(""), None);
    }

    #[test]
    fn rejects_non_numeric_fields() {
        assert_eq!(parse_frame("1 2 three 4 5"), None);
    }
}

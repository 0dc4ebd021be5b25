//! Command dispatcher
//!
//! Pops pending command records and turns them into GATT writes. The
//! queue serves newest-first; the loop polls on a fixed 10 ms interval.

use crate::domain::commands::{Command, CommandQueue};
use crate::infrastructure::bluetooth::profile;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Fixed delay between queue polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Which characteristic a planned write lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    LedText,
    LedMatrix,
}

/// A device write derived from one command record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub target: WriteTarget,
    pub payload: Vec<u8>,
    /// Read the characteristic back after writing, for confirmation in
    /// the debug log.
    pub read_back: bool,
}

/// Translate a queue record into a device write.
///
/// Unknown tags and unknown pattern names plan nothing and are dropped
/// without comment.
pub fn plan(record: &str) -> Option<PlannedWrite> {
    match Command::parse(record)? {
        Command::ScrollText(text) => {
            let mut payload = text.into_bytes();
            payload.truncate(profile::LED_TEXT_MAX_OCTETS);
            Some(PlannedWrite {
                target: WriteTarget::LedText,
                payload,
                read_back: false,
            })
        }
        Command::ClearDisplay(flag) => {
            let fill = if flag == "0" { 0x00 } else { 0xFF };
            Some(PlannedWrite {
                target: WriteTarget::LedMatrix,
                payload: vec![fill; 5],
                read_back: false,
            })
        }
        Command::LedMatrix(rows) => Some(PlannedWrite {
            target: WriteTarget::LedMatrix,
            payload: rows.to_vec(),
            read_back: false,
        }),
        Command::LedMatrixPattern(name) => {
            profile::matrix_pattern(&name).map(|bits| PlannedWrite {
                target: WriteTarget::LedMatrix,
                payload: bits.to_vec(),
                read_back: true,
            })
        }
    }
}

/// The connected device's writable side.
pub struct DeviceLink {
    pub peripheral: Peripheral,
    pub led_text: Option<Characteristic>,
    pub led_matrix: Option<Characteristic>,
}

/// Drains the command queue towards the device.
///
/// Without a link (not connected) every dispatch is a no-op, performing
/// zero writes and raising no error.
pub struct CommandDispatcher {
    queue: Arc<CommandQueue>,
    link: Option<DeviceLink>,
}

impl CommandDispatcher {
    pub fn new(queue: Arc<CommandQueue>) -> Self {
        Self { queue, link: None }
    }

    pub fn with_link(queue: Arc<CommandQueue>, link: DeviceLink) -> Self {
        Self {
            queue,
            link: Some(link),
        }
    }

    /// Poll loop: one pop per iteration, 10 ms sleep whether or not any
    /// work was done.
    pub async fn run(&self) {
        loop {
            if let Some(record) = self.queue.pop() {
                self.dispatch(&record).await;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Execute one record against the device, if one is attached.
    pub async fn dispatch(&self, record: &str) {
        let Some(write) = plan(record) else {
            return;
        };
        let Some(link) = &self.link else {
            debug!("no device attached, dropping command");
            return;
        };

        let characteristic = match write.target {
            WriteTarget::LedText => link.led_text.as_ref(),
            WriteTarget::LedMatrix => link.led_matrix.as_ref(),
        };
        let Some(characteristic) = characteristic else {
            warn!(write_target = ?write.target, "characteristic missing on device, dropping command");
            return;
        };

        if let Err(err) = link
            .peripheral
            .write(characteristic, &write.payload, WriteType::WithoutResponse)
            .await
        {
            warn!(%err, "characteristic write failed");
            return;
        }

        if write.read_back {
            match link.peripheral.read(characteristic).await {
                Ok(bytes) => debug!(?bytes, "pattern write confirmed"),
                Err(err) => debug!(%err, "pattern read-back failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_display_zero_plans_all_dark() {
        let write = plan("clear_display\u{0}0").unwrap();
        assert_eq!(write.target, WriteTarget::LedMatrix);
        assert_eq!(write.payload, vec![0x00; 5]);
    }

    #[test]
    fn clear_display_nonzero_plans_all_lit() {
        let write = plan("clear_display\u{0}1").unwrap();
        assert_eq!(write.payload, vec![0xFF; 5]);
    }

    #[test]
    fn arrow_left_pattern_plans_fixed_bitmap() {
        let write = plan("led_matrix_pattern\u{0}Arrow Left").unwrap();
        assert_eq!(write.target, WriteTarget::LedMatrix);
        assert_eq!(write.payload, vec![0x04, 0x08, 0x1F, 0x08, 0x04]);
        assert!(write.read_back);
    }

    #[test]
    fn unknown_pattern_plans_nothing() {
        assert_eq!(plan("led_matrix_pattern\u{0}Spiral"), None);
    }

    #[test]
    fn scroll_text_is_truncated_to_twenty_octets() {
        let record = format!("scroll_text\u{0}{}", "A".repeat(32));
        let write = plan(&record).unwrap();
        assert_eq!(write.target, WriteTarget::LedText);
        assert_eq!(write.payload.len(), 20);
        assert_eq!(write.payload, b"A".repeat(20));
    }

    #[test]
    fn led_matrix_rows_pass_through_raw() {
        let write = plan("led_matrix\u{0}4\u{0}8\u{0}31\u{0}8\u{0}4").unwrap();
        assert_eq!(write.payload, vec![4, 8, 31, 8, 4]);
    }

    #[test]
    fn unknown_tag_plans_nothing() {
        assert_eq!(plan("set_volume\u{0}9"), None);
    }

    #[tokio::test]
    async fn dispatch_without_device_is_a_quiet_no_op() {
        let queue = Arc::new(CommandQueue::new());
        let dispatcher = CommandDispatcher::new(queue);
        dispatcher.dispatch("clear_display\u{0}0").await;
        dispatcher.dispatch("scroll_text\u{0}HELLO").await;
    }
}

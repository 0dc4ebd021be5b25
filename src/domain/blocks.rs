//! Block facade
//!
//! The bridge's operations as seen by the visual programming environment:
//! reporters (sensor values), predicates (tilt/orientation tests) and
//! commands (LED output). Blocks are declared in a static registration
//! table; the server walks the table for polling and command dispatch.

use crate::domain::commands::{Command, CommandQueue};
use crate::domain::state::DeviceState;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Accelerometer reading beyond which an axis counts as tilted.
pub const TILT_TOLERANCE: i16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Reporter,
    Predicate,
    Command,
}

/// One entry in the block registry.
pub struct BlockSpec {
    /// Wire name, used in poll output and command paths.
    pub name: &'static str,
    /// Human-readable label shown on the block.
    pub label: &'static str,
    pub kind: BlockKind,
}

/// Every block the bridge exposes. Order is the palette order.
pub const BLOCKS: &[BlockSpec] = &[
    BlockSpec {
        name: "button_a",
        label: "Button A",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "button_b",
        label: "Button B",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "tilt_left",
        label: "Tilted Left?",
        kind: BlockKind::Predicate,
    },
    BlockSpec {
        name: "tilt_right",
        label: "Tilted Right?",
        kind: BlockKind::Predicate,
    },
    BlockSpec {
        name: "tilt_down",
        label: "Tilted Down?",
        kind: BlockKind::Predicate,
    },
    BlockSpec {
        name: "tilt_up",
        label: "Tilted Up?",
        kind: BlockKind::Predicate,
    },
    BlockSpec {
        name: "face_up",
        label: "Face Up?",
        kind: BlockKind::Predicate,
    },
    BlockSpec {
        name: "face_down",
        label: "Face Down?",
        kind: BlockKind::Predicate,
    },
    BlockSpec {
        name: "acc_x",
        label: "X-Accelerometer",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "acc_y",
        label: "Y-Accelerometer",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "acc_z",
        label: "Z-Accelerometer",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "mag_x",
        label: "X-Magnetometer",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "mag_y",
        label: "Y-Magnetometer",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "mag_z",
        label: "Z-Magnetometer",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "mag_bearing",
        label: "Compass Bearing",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "temperature",
        label: "Temperature",
        kind: BlockKind::Reporter,
    },
    BlockSpec {
        name: "scroll_text",
        label: "Scroll %s",
        kind: BlockKind::Command,
    },
    BlockSpec {
        name: "led_matrix_pattern",
        label: "Set LED Matrix %m.matrix_pattern",
        kind: BlockKind::Command,
    },
    BlockSpec {
        name: "led_matrix",
        label: "Set LED Matrix Rows %d %d %d %d %d",
        kind: BlockKind::Command,
    },
    BlockSpec {
        name: "clear_display",
        label: "Clear Display %d.clear_type",
        kind: BlockKind::Command,
    },
];

/// Value produced by a reporter or predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockValue {
    Int(i64),
    Bool(bool),
}

impl fmt::Display for BlockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockValue::Int(v) => write!(f, "{v}"),
            BlockValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Reads device state for reporters/predicates and enqueues commands.
pub struct BlockFacade {
    state: Arc<DeviceState>,
    queue: Arc<CommandQueue>,
}

impl BlockFacade {
    pub fn new(state: Arc<DeviceState>, queue: Arc<CommandQueue>) -> Self {
        Self { state, queue }
    }

    /// Evaluate a reporter or predicate by wire name.
    pub fn value(&self, name: &str) -> Option<BlockValue> {
        let (acc_x, acc_y, acc_z) = self.state.accelerometer();
        let (mag_x, mag_y, mag_z) = self.state.magnetometer();
        let value = match name {
            "button_a" => BlockValue::Int(self.state.button_a() as i64),
            "button_b" => BlockValue::Int(self.state.button_b() as i64),
            "acc_x" => BlockValue::Int(acc_x as i64),
            "acc_y" => BlockValue::Int(acc_y as i64),
            "acc_z" => BlockValue::Int(acc_z as i64),
            "mag_x" => BlockValue::Int(mag_x as i64),
            "mag_y" => BlockValue::Int(mag_y as i64),
            "mag_z" => BlockValue::Int(mag_z as i64),
            "mag_bearing" => BlockValue::Int(self.state.bearing() as i64),
            "temperature" => BlockValue::Int(self.state.temperature() as i64),
            "tilt_left" => BlockValue::Bool(acc_x < -TILT_TOLERANCE),
            "tilt_right" => BlockValue::Bool(acc_x > TILT_TOLERANCE),
            "tilt_down" => BlockValue::Bool(acc_y < -TILT_TOLERANCE),
            "tilt_up" => BlockValue::Bool(acc_y > TILT_TOLERANCE),
            // Face up/down polarity follows the firmware's sign convention.
            "face_up" => BlockValue::Bool(acc_z < -TILT_TOLERANCE),
            "face_down" => BlockValue::Bool(acc_z > TILT_TOLERANCE),
            _ => return None,
        };
        Some(value)
    }

    /// All reporter and predicate values, in palette order.
    pub fn poll(&self) -> Vec<(&'static str, BlockValue)> {
        BLOCKS
            .iter()
            .filter(|spec| spec.kind != BlockKind::Command)
            .filter_map(|spec| self.value(spec.name).map(|v| (spec.name, v)))
            .collect()
    }

    /// Invoke a command block. Returns false for unknown names or
    /// arguments that fail sanitization; nothing is enqueued then.
    pub fn invoke(&self, name: &str, args: &[String]) -> bool {
        let command = match name {
            "scroll_text" => args.first().map(|text| Command::ScrollText(text.clone())),
            "led_matrix_pattern" => args
                .first()
                .map(|pattern| Command::LedMatrixPattern(pattern.clone())),
            "led_matrix" => parse_rows(args).map(Command::LedMatrix),
            "clear_display" => args
                .first()
                .map(|flag| Command::ClearDisplay(digits_only(flag))),
            _ => None,
        };
        match command {
            Some(command) => {
                debug!(block = name, "enqueueing command");
                self.queue.push(command.encode());
                true
            }
            None => {
                debug!(block = name, ?args, "ignoring command");
                false
            }
        }
    }

    /// Stop-button hook. Logs only; no state is restored here.
    pub fn reset(&self) {
        info!("Reset! The red stop button has been clicked, and now everything is how it was.");
    }
}

/// Strip everything but ASCII digits from a numeric-looking argument.
fn digits_only(arg: &str) -> String {
    arg.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Sanitize five row arguments into row bitmasks (low 5 bits).
fn parse_rows(args: &[String]) -> Option<[u8; 5]> {
    if args.len() != 5 {
        return None;
    }
    let mut rows = [0u8; 5];
    for (slot, arg) in rows.iter_mut().zip(args) {
        let value: u32 = digits_only(arg).parse().ok()?;
        *slot = (value & 0x1F) as u8;
    }
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::Command;

    fn facade() -> (Arc<DeviceState>, Arc<CommandQueue>, BlockFacade) {
        let state = Arc::new(DeviceState::new());
        let queue = Arc::new(CommandQueue::new());
        let facade = BlockFacade::new(state.clone(), queue.clone());
        (state, queue, facade)
    }

    #[test]
    fn tilt_predicates_at_threshold() {
        let (state, _, facade) = facade();
        state.set_accelerometer(250, -250, 0);

        assert_eq!(facade.value("tilt_right"), Some(BlockValue::Bool(true)));
        assert_eq!(facade.value("tilt_left"), Some(BlockValue::Bool(false)));
        assert_eq!(facade.value("tilt_up"), Some(BlockValue::Bool(false)));
        assert_eq!(facade.value("tilt_down"), Some(BlockValue::Bool(true)));
        assert_eq!(facade.value("face_up"), Some(BlockValue::Bool(false)));
        assert_eq!(facade.value("face_down"), Some(BlockValue::Bool(false)));
    }

    #[test]
    fn exactly_200_is_not_tilted() {
        let (state, _, facade) = facade();
        state.set_accelerometer(200, -200, 0);
        assert_eq!(facade.value("tilt_right"), Some(BlockValue::Bool(false)));
        assert_eq!(facade.value("tilt_down"), Some(BlockValue::Bool(false)));
    }

    #[test]
    fn reporters_echo_state() {
        let (state, _, facade) = facade();
        state.set_button_a(2);
        state.set_temperature(-7);
        state.set_bearing(270);
        assert_eq!(facade.value("button_a"), Some(BlockValue::Int(2)));
        assert_eq!(facade.value("temperature"), Some(BlockValue::Int(-7)));
        assert_eq!(facade.value("mag_bearing"), Some(BlockValue::Int(270)));
        assert_eq!(facade.value("no_such_block"), None);
    }

    #[test]
    fn poll_covers_every_non_command_block() {
        let (_, _, facade) = facade();
        let expected = BLOCKS
            .iter()
            .filter(|s| s.kind != BlockKind::Command)
            .count();
        assert_eq!(facade.poll().len(), expected);
    }

    #[test]
    fn invoke_enqueues_encoded_record() {
        let (_, queue, facade) = facade();
        assert!(facade.invoke("scroll_text", &["HELLO".into()]));
        assert_eq!(
            queue.pop().as_deref(),
            Some(Command::ScrollText("HELLO".into()).encode().as_str())
        );
    }

    #[test]
    fn led_matrix_rows_are_sanitized_and_masked() {
        let (_, queue, facade) = facade();
        let args: Vec<String> = ["4", "8px", "31", "40", "4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(facade.invoke("led_matrix", &args));
        // "8px" strips to 8; 40 masks to 8.
        assert_eq!(
            Command::parse(&queue.pop().unwrap()),
            Some(Command::LedMatrix([4, 8, 31, 8, 4]))
        );
    }

    #[test]
    fn led_matrix_with_unparseable_row_enqueues_nothing() {
        let (_, queue, facade) = facade();
        let args: Vec<String> = ["4", "px", "31", "8", "4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(!facade.invoke("led_matrix", &args));
        assert!(queue.is_empty());
    }

    #[test]
    fn unknown_command_enqueues_nothing() {
        let (_, queue, facade) = facade();
        assert!(!facade.invoke("play_tune", &["C4".into()]));
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_display_flag_is_digit_stripped() {
        let (_, queue, facade) = facade();
        assert!(facade.invoke("clear_display", &["0 ".into()]));
        assert_eq!(
            Command::parse(&queue.pop().unwrap()),
            Some(Command::ClearDisplay("0".into()))
        );
    }
}

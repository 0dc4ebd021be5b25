//! micro:bit Bluetooth Profile
//!
//! UUID table for the services and characteristics the bridge touches,
//! plus the named LED matrix bitmaps. The 128-bit values come from the
//! Lancaster University micro:bit Bluetooth profile.

use uuid::{uuid, Uuid};

/// Button service
pub const BUTTON_SERVICE: Uuid = uuid!("e95d9882-251d-470a-a062-fa1922dfa9a8");
/// Button A state: 0 = not pressed, 1 = pressed, 2 = long press
pub const BUTTON_A_STATE: Uuid = uuid!("e95dda90-251d-470a-a062-fa1922dfa9a8");
/// Button B state
pub const BUTTON_B_STATE: Uuid = uuid!("e95dda91-251d-470a-a062-fa1922dfa9a8");

/// Accelerometer service
pub const ACCELEROMETER_SERVICE: Uuid = uuid!("e95d0753-251d-470a-a062-fa1922dfa9a8");
/// X, Y, Z as three signed 16-bit little-endian values
pub const ACCELEROMETER_DATA: Uuid = uuid!("e95dca4b-251d-470a-a062-fa1922dfa9a8");
/// Report interval in ms: 1, 2, 5, 10, 20, 80, 160 or 640
pub const ACCELEROMETER_PERIOD: Uuid = uuid!("e95dfb24-251d-470a-a062-fa1922dfa9a8");

/// Magnetometer service
pub const MAGNETOMETER_SERVICE: Uuid = uuid!("e95df2d8-251d-470a-a062-fa1922dfa9a8");
/// X, Y, Z as three signed 16-bit little-endian values
pub const MAGNETOMETER_DATA: Uuid = uuid!("e95dfb11-251d-470a-a062-fa1922dfa9a8");
/// Report interval in ms
pub const MAGNETOMETER_PERIOD: Uuid = uuid!("e95d386c-251d-470a-a062-fa1922dfa9a8");
/// Compass bearing in degrees from North, unsigned 16-bit
pub const MAGNETOMETER_BEARING: Uuid = uuid!("e95d9715-251d-470a-a062-fa1922dfa9a8");

/// Temperature service
pub const TEMPERATURE_SERVICE: Uuid = uuid!("e95d6100-251d-470a-a062-fa1922dfa9a8");
/// Signed 8-bit value in degrees Celsius
pub const TEMPERATURE_DATA: Uuid = uuid!("e95d9250-251d-470a-a062-fa1922dfa9a8");
/// Report interval in ms
pub const TEMPERATURE_PERIOD: Uuid = uuid!("e95d1b25-251d-470a-a062-fa1922dfa9a8");

/// LED service
pub const LED_SERVICE: Uuid = uuid!("e95dd91d-251d-470a-a062-fa1922dfa9a8");
/// Scrolling text, UTF-8, maximum length 20 octets
pub const LED_TEXT: Uuid = uuid!("e95d93ee-251d-470a-a062-fa1922dfa9a8");
/// 5 octets, one per row, low 5 bits = column bitmask
pub const LED_MATRIX_STATE: Uuid = uuid!("e95d7b77-251d-470a-a062-fa1922dfa9a8");

/// Maximum scrolling text length the LED text characteristic accepts.
pub const LED_TEXT_MAX_OCTETS: usize = 20;

/// Named 5x5 LED bitmaps selectable from the pattern menu.
pub const LED_MATRIX_PATTERNS: &[(&str, [u8; 5])] = &[
    ("Arrow Left", [0x04, 0x08, 0x1F, 0x08, 0x04]),
    ("Arrow Right", [0x04, 0x02, 0x1F, 0x02, 0x04]),
    ("Arrow Up", [0x04, 0x0E, 0x15, 0x04, 0x04]),
    ("Arrow Down", [0x04, 0x04, 0x15, 0x0E, 0x04]),
];

/// Look up a named LED bitmap. Unknown names return `None` and the
/// command that carried them is dropped.
pub fn matrix_pattern(name: &str) -> Option<[u8; 5]> {
    LED_MATRIX_PATTERNS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, bits)| *bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_left_bitmap() {
        assert_eq!(
            matrix_pattern("Arrow Left"),
            Some([0x04, 0x08, 0x1F, 0x08, 0x04])
        );
    }

    #[test]
    fn unknown_pattern_is_none() {
        assert_eq!(matrix_pattern("Spiral"), None);
    }

    #[test]
    fn vendor_uuids_share_the_microbit_suffix() {
        for id in [
            BUTTON_A_STATE,
            BUTTON_B_STATE,
            ACCELEROMETER_DATA,
            MAGNETOMETER_DATA,
            MAGNETOMETER_BEARING,
            TEMPERATURE_DATA,
            LED_TEXT,
            LED_MATRIX_STATE,
        ] {
            assert!(id.to_string().ends_with("-251d-470a-a062-fa1922dfa9a8"));
        }
    }
}

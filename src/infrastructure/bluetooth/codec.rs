//! Notification payload decoding
//!
//! The micro:bit sends fixed-width little-endian integers in its GATT
//! notifications. Short payloads are reported as typed errors so the
//! telemetry loop can log and drop them instead of dying.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload truncated: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
}

fn require(payload: &[u8], expected: usize) -> Result<(), DecodeError> {
    if payload.len() < expected {
        Err(DecodeError::Truncated {
            expected,
            got: payload.len(),
        })
    } else {
        Ok(())
    }
}

/// Single unsigned byte (button state).
pub fn uint8(payload: &[u8]) -> Result<u8, DecodeError> {
    require(payload, 1)?;
    Ok(payload[0])
}

/// Single signed byte (temperature in degrees Celsius).
pub fn sint8(payload: &[u8]) -> Result<i8, DecodeError> {
    require(payload, 1)?;
    Ok(payload[0] as i8)
}

/// Unsigned 16-bit little-endian (compass bearing).
pub fn uint16_le(payload: &[u8]) -> Result<u16, DecodeError> {
    require(payload, 2)?;
    Ok(u16::from_le_bytes([payload[0], payload[1]]))
}

/// Signed 16-bit little-endian (accelerometer / magnetometer axes).
///
/// Two's-complement conversion is spelled out the way the device docs
/// describe it: a set top bit means `v = -((v ^ 0xFFFF) + 1)`.
pub fn sint16_le(payload: &[u8]) -> Result<i16, DecodeError> {
    require(payload, 2)?;
    let v = u16::from_le_bytes([payload[0], payload[1]]) as i32;
    let v = if v & 0x8000 == 0x8000 {
        -((v ^ 0xFFFF) + 1)
    } else {
        v
    };
    Ok(v as i16)
}

/// Three signed 16-bit little-endian values: X, Y, Z in that order.
pub fn vector16_le(payload: &[u8]) -> Result<(i16, i16, i16), DecodeError> {
    require(payload, 6)?;
    Ok((
        sint16_le(&payload[0..2])?,
        sint16_le(&payload[2..4])?,
        sint16_le(&payload[4..6])?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sint16_round_trips_full_range() {
        for v in [-32768i16, -32767, -250, -1, 0, 1, 200, 32766, 32767] {
            let bytes = v.to_le_bytes();
            assert_eq!(sint16_le(&bytes).unwrap(), v);
        }
    }

    #[test]
    fn sint16_matches_native_cast_exhaustively() {
        for raw in 0..=u16::MAX {
            let bytes = raw.to_le_bytes();
            assert_eq!(sint16_le(&bytes).unwrap(), raw as i16);
        }
    }

    #[test]
    fn uint8_passes_through_all_values() {
        for v in 0..=u8::MAX {
            assert_eq!(uint8(&[v]).unwrap(), v);
        }
    }

    #[test]
    fn sint8_is_twos_complement() {
        assert_eq!(sint8(&[0xFF]).unwrap(), -1);
        assert_eq!(sint8(&[0x80]).unwrap(), -128);
        assert_eq!(sint8(&[0x19]).unwrap(), 25);
    }

    #[test]
    fn uint16_is_little_endian() {
        assert_eq!(uint16_le(&[0x2C, 0x01]).unwrap(), 300);
    }

    #[test]
    fn vector16_splits_xyz_in_order() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&250i16.to_le_bytes());
        payload.extend_from_slice(&(-250i16).to_le_bytes());
        payload.extend_from_slice(&0i16.to_le_bytes());
        assert_eq!(vector16_le(&payload).unwrap(), (250, -250, 0));
    }

    #[test]
    fn short_payloads_are_typed_errors() {
        assert_eq!(
            uint8(&[]),
            Err(DecodeError::Truncated {
                expected: 1,
                got: 0
            })
        );
        assert_eq!(
            vector16_le(&[1, 2, 3]),
            Err(DecodeError::Truncated {
                expected: 6,
                got: 3
            })
        );
    }
}

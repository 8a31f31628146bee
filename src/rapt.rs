//! RAPT Pill v2 advertisement frame decoder.
//!
//! The RAPT Pill broadcasts a fixed 23-byte manufacturer-data frame with
//! big-endian multi-byte fields:
//!
//! | Offset | Size | Field                                    |
//! |--------|------|------------------------------------------|
//! | 0-1    | 2    | Magic `"PT"` (ASCII)                     |
//! | 2      | 1    | Protocol version, must be 2              |
//! | 3      | 1    | Reserved                                 |
//! | 4      | 1    | Velocity-valid flag (nonzero = valid)    |
//! | 5-8    | 4    | Raw fermentation velocity (IEEE-754 f32) |
//! | 9-10   | 2    | Raw temperature (u16)                    |
//! | 11-14  | 4    | Raw gravity (IEEE-754 f32)               |
//! | 15-16  | 2    | Raw accelerometer X (u16)                |
//! | 17-18  | 2    | Raw accelerometer Y (u16)                |
//! | 19-20  | 2    | Raw accelerometer Z (u16)                |
//! | 21-22  | 2    | Raw battery (u16)                        |
//!
//! Decoding is a pure, stateless transform and is safe to call concurrently.
//! Malformed or foreign frames are common on a shared BLE spectrum, so every
//! failure is a recoverable, named error; callers drop the packet and keep
//! scanning.

use crate::mac_address::MacAddress;
use crate::measurement::Measurement;
use std::time::SystemTime;
use thiserror::Error;

/// Exact length of a v2 advertisement frame.
pub const FRAME_LEN: usize = 23;

/// Magic prefix identifying a RAPT Pill frame.
pub const MAGIC: [u8; 2] = *b"PT";

/// The only supported protocol version. Version 1 uses a different,
/// MAC-address-bearing layout without fermentation velocity and is rejected
/// rather than misparsed.
pub const PROTOCOL_VERSION: u8 = 2;

/// Raw velocity readings outside [-MAX_ABS_VELOCITY, MAX_ABS_VELOCITY] are
/// treated as sensor glitches and dropped.
const MAX_ABS_VELOCITY: f32 = 100.0;

/// Error types for decoding RAPT Pill frames.
///
/// The taxonomy is closed: once the three validation gates pass, extraction
/// is fixed-width reads from a buffer of proven length and cannot fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Frame is not exactly [`FRAME_LEN`] bytes
    #[error("invalid frame length: expected 23 bytes, got {actual}")]
    InvalidLength { actual: usize },
    /// First two bytes are not the `"PT"` magic
    #[error("invalid magic: expected \"PT\", got {actual:02X?}")]
    InvalidMagic { actual: [u8; 2] },
    /// Version byte is not [`PROTOCOL_VERSION`]
    #[error("unsupported protocol version {found} (only v2 is supported)")]
    UnsupportedVersion { found: u8 },
}

/// Decode a raw RAPT Pill advertisement frame into a [`Measurement`].
///
/// The input must be the complete 23-byte frame including the `"PT"` magic
/// bytes (which double as the little-endian manufacturer ID on the wire).
/// The measurement timestamp is assigned at decode time; the frame itself
/// carries no clock.
///
/// # Arguments
/// * `mac` - The MAC address of the advertising device
/// * `data` - The complete advertisement frame
///
/// # Unit Conversions
/// - Temperature: raw / 128 Kelvin, converted to Celsius
/// - Gravity: raw / 1000
/// - Acceleration axes: raw / 16 (unsigned interpretation)
/// - Battery: raw / 256, yielding percent
/// - Velocity: sign-inverted after sanitization, so positive means gravity
///   is dropping
pub fn decode_rapt_data(mac: MacAddress, data: &[u8]) -> Result<Measurement, DecodeError> {
    if data.len() != FRAME_LEN {
        return Err(DecodeError::InvalidLength { actual: data.len() });
    }
    if data[0..2] != MAGIC {
        return Err(DecodeError::InvalidMagic {
            actual: [data[0], data[1]],
        });
    }
    if data[2] != PROTOCOL_VERSION {
        return Err(DecodeError::UnsupportedVersion { found: data[2] });
    }
    // data[3] is reserved and skipped

    let velocity_valid = data[4] != 0;
    let raw_velocity = f32::from_be_bytes([data[5], data[6], data[7], data[8]]);
    let raw_temperature = u16::from_be_bytes([data[9], data[10]]);
    let raw_gravity = f32::from_be_bytes([data[11], data[12], data[13], data[14]]);
    let raw_x = u16::from_be_bytes([data[15], data[16]]);
    let raw_y = u16::from_be_bytes([data[17], data[18]]);
    let raw_z = u16::from_be_bytes([data[19], data[20]]);
    let raw_battery = u16::from_be_bytes([data[21], data[22]]);

    let velocity = if velocity_valid {
        sanitize_velocity(raw_velocity)
    } else {
        None
    };

    Ok(Measurement {
        mac,
        timestamp: SystemTime::now(),
        temperature: f64::from(raw_temperature) / 128.0 - 273.15,
        gravity: f64::from(raw_gravity) / 1000.0,
        velocity,
        acceleration: (
            f64::from(raw_x) / 16.0,
            f64::from(raw_y) / 16.0,
            f64::from(raw_z) / 16.0,
        ),
        battery: f64::from(raw_battery) / 256.0,
    })
}

/// Drop non-finite and out-of-range raw velocities; negate the rest.
///
/// The device reports gravity change per day, so a fermenting batch shows a
/// negative wire value. The sign flip makes "fermentation progressing" read
/// as positive downstream.
fn sanitize_velocity(raw: f32) -> Option<f64> {
    if raw.is_finite() && (-MAX_ABS_VELOCITY..=MAX_ABS_VELOCITY).contains(&raw) {
        Some(-f64::from(raw))
    } else {
        None
    }
}

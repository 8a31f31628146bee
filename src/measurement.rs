//! RAPT Pill measurement data structure.

use crate::mac_address::MacAddress;

/// A single decoded measurement from a RAPT Pill hydrometer.
///
/// Units:
/// - Temperature in Celsius
/// - Gravity as specific gravity (dimensionless, ~1.000-1.150 while brewing)
/// - Velocity in gravity points per day, sign-inverted so that a positive
///   value means gravity is dropping (fermentation progressing)
/// - Acceleration axes as raw sensor counts divided by 16
/// - Battery in percent (0-100)
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// MAC address of the RAPT Pill (stored as efficient 6-byte array)
    pub mac: MacAddress,
    /// Timestamp when the measurement was decoded
    pub timestamp: std::time::SystemTime,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Specific gravity
    pub gravity: f64,
    /// Fermentation velocity in gravity points per day.
    ///
    /// `None` when the device marked the value invalid or when the raw
    /// reading failed sanitization (non-finite or out of range).
    pub velocity: Option<f64>,
    /// Accelerometer vector (x, y, z) in raw counts / 16
    pub acceleration: (f64, f64, f64),
    /// Battery charge in percent
    pub battery: f64,
}

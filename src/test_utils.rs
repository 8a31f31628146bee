use crate::mac_address::MacAddress;
use crate::measurement::Measurement;
use crate::rapt::FRAME_LEN;
use std::time::SystemTime;

/// A stable MAC address for unit tests.
pub const TEST_MAC: MacAddress = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

/// A complete v2 advertisement frame captured from a real RAPT Pill.
///
/// Decodes to temperature 26.19 C, gravity 1.488, velocity +2.46 points/day
/// (after sign inversion), battery 100%.
pub fn captured_frame() -> [u8; FRAME_LEN] {
    [
        0x50, 0x54, 0x02, 0x00, 0x01, 0xC0, 0x1D, 0x9D, 0xBD, 0x95, 0xAB, 0x44, 0xBA, 0x02, 0x32,
        0xFC, 0x8B, 0xC5, 0x21, 0x12, 0x79, 0x64, 0x00,
    ]
}

/// Build a `Measurement` with neutral values.
///
/// Tests can override just the fields they care about.
pub fn base_measurement(mac: MacAddress, timestamp: SystemTime) -> Measurement {
    Measurement {
        mac,
        timestamp,
        temperature: 20.0,
        gravity: 1.0,
        velocity: None,
        acceleration: (0.0, 0.0, 0.0),
        battery: 50.0,
    }
}

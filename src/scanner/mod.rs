//! BLE scanner abstraction for RAPT Pill devices.
//!
//! This module provides dispatch over different Bluetooth scanning backends,
//! with shared plumbing for handing advertisement frames to the decoder in
//! [`crate::rapt`].

#[cfg(feature = "bluer")]
pub mod bluer;

#[cfg(feature = "hci")]
pub mod hci;

use crate::measurement::Measurement;
use crate::rapt::DecodeError;
use thiserror::Error;
use tokio::sync::mpsc;

/// Convenience alias for decoded measurements or decode errors.
pub type MeasurementResult = Result<Measurement, DecodeError>;

/// Error type for scanner operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Bluetooth/adapter related error
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
    /// Data decoding error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Backend not available (not compiled in)
    #[allow(dead_code)]
    #[error("Backend '{0}' not available (not compiled in)")]
    BackendNotAvailable(String),
}

/// KegLand RAPT manufacturer ID bytes as they appear on the wire.
///
/// Bluetooth LE advertisements store the 16-bit manufacturer code
/// little-endian, so 0x5450 is broadcast as the ASCII bytes `"PT"`.
/// These are the same bytes the decoder validates as the frame magic.
pub const RAPT_MANUFACTURER_ID_BYTES: [u8; 2] = *b"PT";

/// KegLand RAPT manufacturer ID for data lookup (0x5450).
///
/// This is the numeric form used when looking up manufacturer-specific data
/// from device advertisements.
#[cfg(any(feature = "bluer", feature = "hci"))]
pub const RAPT_MANUFACTURER_ID: u16 = u16::from_le_bytes(RAPT_MANUFACTURER_ID_BYTES);

/// Bluetooth manufacturer-specific data type (AD type 0xFF)
#[cfg(feature = "bluer")]
pub const MANUFACTURER_DATA_TYPE: u8 = 0xff;

/// Channel buffer size for measurement results.
pub const MEASUREMENT_CHANNEL_BUFFER_SIZE: usize = 100;

/// Rebuild the full advertisement frame from manufacturer data that has had
/// its 2-byte company identifier stripped (as BlueZ does).
///
/// The decoder validates the complete 23-byte frame including the magic
/// bytes, which are exactly the stripped company identifier.
#[cfg(feature = "bluer")]
pub(crate) fn rebuild_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(RAPT_MANUFACTURER_ID_BYTES.len() + payload.len());
    frame.extend_from_slice(&RAPT_MANUFACTURER_ID_BYTES);
    frame.extend_from_slice(payload);
    frame
}

/// Available scanner backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// BlueZ D-Bus backend (requires bluetoothd daemon)
    #[cfg(feature = "bluer")]
    Bluer,
    /// Raw HCI socket backend (direct kernel access, no daemon required)
    #[cfg(feature = "hci")]
    Hci,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "bluer")]
        return Backend::Bluer;
        #[cfg(all(feature = "hci", not(feature = "bluer")))]
        return Backend::Hci;
        #[cfg(not(any(feature = "bluer", feature = "hci")))]
        compile_error!("At least one backend feature must be enabled");
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "bluer")]
            Backend::Bluer => write!(f, "bluer"),
            #[cfg(feature = "hci")]
            Backend::Hci => write!(f, "hci"),
            #[cfg(not(any(feature = "bluer", feature = "hci")))]
            _ => unreachable!("Backend enum has no variants when no backend features are enabled"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            #[cfg(feature = "bluer")]
            "bluer" | "bluez" => Ok(Backend::Bluer),
            #[cfg(feature = "hci")]
            "hci" | "raw" => Ok(Backend::Hci),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Start scanning for RAPT Pill devices using the specified backend.
///
/// This is the main entry point for creating a scanner. It dispatches to the
/// appropriate backend implementation based on the `backend` parameter.
///
/// # Arguments
/// * `backend` - The scanner backend to use
/// * `verbose` - If true, decode errors are sent as Err values; otherwise they're silently dropped.
///
/// # Returns
/// A receiver for measurements (or decode errors if verbose).
pub async fn start_scan(
    backend: Backend,
    verbose: bool,
) -> Result<mpsc::Receiver<MeasurementResult>, ScanError> {
    match backend {
        #[cfg(feature = "bluer")]
        Backend::Bluer => bluer::start_scan(verbose).await,
        #[cfg(feature = "hci")]
        Backend::Hci => hci::start_scan(verbose).await,
    }
}

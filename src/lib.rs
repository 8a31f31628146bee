//! `rapt-pill-listener` library.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing and process exit codes.
//! The core “business logic” lives in [`crate::app`] where it can be tested
//! deterministically with injected scanner + injected output streams. The
//! advertisement frame decoder itself lives in [`crate::rapt`] as a pure
//! function over raw bytes.

pub mod alias;
pub mod app;
pub mod mac_address;
pub mod measurement;
pub mod output;
pub mod rapt;
pub mod scanner;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types at the crate root
pub use alias::{Alias, AliasMap, parse_alias, resolve_name, to_map};
pub use mac_address::MacAddress;
pub use measurement::Measurement;
pub use output::OutputFormatter;
pub use output::influxdb::InfluxDbFormatter;
pub use rapt::{DecodeError, decode_rapt_data};
pub use scanner::{Backend, MeasurementResult, ScanError};
pub use throttle::{Throttle, parse_duration};

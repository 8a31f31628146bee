//! Bluetooth device identity for RAPT Pill hydrometers.
//!
//! A Pill is identified by its 6-byte Bluetooth MAC address. Keeping the
//! address as a plain array gives a cheap, hashable key for the alias and
//! throttle maps without tying the crate to one Bluetooth backend.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// A Bluetooth MAC address stored as a 6-byte array.
///
/// `Copy` and `Hash` so it can be passed around and used as a map key
/// without allocation. Conversions to and from `bluer::Address` are
/// feature-gated; the type itself has no backend dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Errors returned when parsing a MAC address string.
#[derive(Error, Debug, PartialEq)]
pub enum ParseMacError {
    /// Wrong number of colon-separated octets
    #[error("invalid MAC address: expected 6 octets, got {0}")]
    OctetCount(usize),
    /// An octet that is not exactly two hex digits
    #[error("invalid MAC address: octet {0} is not two hex digits")]
    BadOctet(usize),
}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut seen = 0;

        for (i, octet) in s.split(':').enumerate() {
            if i == bytes.len() {
                return Err(ParseMacError::OctetCount(s.split(':').count()));
            }
            if octet.len() != 2 {
                return Err(ParseMacError::BadOctet(i));
            }
            bytes[i] =
                u8::from_str_radix(octet, 16).map_err(|_| ParseMacError::BadOctet(i))?;
            seen = i + 1;
        }

        if seen != bytes.len() {
            return Err(ParseMacError::OctetCount(seen));
        }

        Ok(MacAddress(bytes))
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

#[cfg(feature = "bluer")]
impl From<bluer::Address> for MacAddress {
    fn from(addr: bluer::Address) -> Self {
        Self(addr.0)
    }
}

#[cfg(feature = "bluer")]
impl From<MacAddress> for bluer::Address {
    fn from(addr: MacAddress) -> Self {
        bluer::Address(addr.0)
    }
}

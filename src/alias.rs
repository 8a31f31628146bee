//! MAC address aliasing for RAPT Pill devices.
//!
//! This module provides functionality to map MAC addresses to human-readable
//! names, making it easier to identify individual hydrometers in output
//! (e.g., which fermenter a Pill is floating in).

use crate::mac_address::MacAddress;
use std::collections::HashMap;

/// A type alias for MAC-to-name mappings.
pub type AliasMap = HashMap<MacAddress, String>;

/// A parsed alias mapping a MAC address to a human-readable name.
#[derive(Debug, Clone)]
pub struct Alias {
    /// The MAC address of the device
    pub address: MacAddress,
    /// The human-readable name (e.g., "FermenterA")
    pub name: String,
}

/// Parse an alias from a string in the format "MAC=NAME".
///
/// # Arguments
/// * `src` - A string in the format "AA:BB:CC:DD:EE:FF=Name"
///
/// # Returns
/// A Result containing the parsed Alias or an error message.
///
/// # Example
/// ```
/// use rapt_pill_listener::alias::parse_alias;
///
/// let alias = parse_alias("AA:BB:CC:DD:EE:FF=FermenterA").unwrap();
/// assert_eq!(alias.address.to_string(), "AA:BB:CC:DD:EE:FF");
/// assert_eq!(alias.name, "FermenterA");
/// ```
pub fn parse_alias(src: &str) -> Result<Alias, String> {
    let (address, name) = src
        .split_once('=')
        .ok_or_else(|| "invalid alias: expected format MAC=NAME".to_string())?;

    let address: MacAddress = address.parse().map_err(|e| format!("{e}"))?;

    Ok(Alias {
        address,
        name: name.into(),
    })
}

/// Convert a slice of Alias values into an AliasMap.
pub fn to_map(aliases: &[Alias]) -> AliasMap {
    aliases
        .iter()
        .map(|a| (a.address, a.name.clone()))
        .collect()
}

/// Resolve the display name for a device: its alias if one is configured,
/// otherwise the MAC address rendered as a string.
pub fn resolve_name(mac: &MacAddress, aliases: &AliasMap) -> String {
    aliases
        .get(mac)
        .cloned()
        .unwrap_or_else(|| mac.to_string())
}

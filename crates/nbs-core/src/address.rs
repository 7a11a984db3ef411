//! Address handling shared by the reconciler and its stores
//!
//! IPAM services keep addresses in CIDR form (`10.0.0.1/32`) while host
//! inventories list bare addresses (`10.0.0.1`). Comparison between the two
//! always goes through [`normalize`]: the prefix suffix is dropped and the
//! remainder is compared as an exact string.

use std::net::IpAddr;

use crate::error::{Error, Result};

/// Strip a trailing `/prefix` from an address
///
/// ```rust
/// use nbs_core::address::normalize;
///
/// assert_eq!(normalize("10.0.0.1/32"), "10.0.0.1");
/// assert_eq!(normalize("10.0.0.1"), "10.0.0.1");
/// ```
pub fn normalize(address: &str) -> &str {
    match address.split_once('/') {
        Some((host, _prefix)) => host,
        None => address,
    }
}

/// Full-length prefix for an address: `/32` for IPv4, `/128` for IPv6
pub fn host_prefix(address: &IpAddr) -> u8 {
    match address {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Render an address in the host-route CIDR form used by IPAM services
///
/// Addresses that already carry a prefix, or that do not parse as an IP,
/// are returned unchanged.
pub fn to_host_cidr(address: &str) -> String {
    if address.contains('/') {
        return address.to_string();
    }
    match address.parse::<IpAddr>() {
        Ok(ip) => format!("{}/{}", ip, host_prefix(&ip)),
        Err(_) => address.to_string(),
    }
}

/// Validate that an address is a syntactically valid IP address
///
/// An optional `/prefix` is accepted as long as it is in range for the
/// address family. Returns the normalized (prefix-free) address.
pub fn validate(address: &str) -> Result<String> {
    let (host, prefix) = match address.split_once('/') {
        Some((host, prefix)) => (host, Some(prefix)),
        None => (address, None),
    };

    let ip: IpAddr = host
        .parse()
        .map_err(|_| Error::invalid_input(format!("Invalid IP address: '{}'", address)))?;

    if let Some(prefix) = prefix {
        let bits: u8 = prefix
            .parse()
            .map_err(|_| Error::invalid_input(format!("Invalid prefix length: '{}'", address)))?;
        if bits > host_prefix(&ip) {
            return Err(Error::invalid_input(format!(
                "Prefix length out of range: '{}'",
                address
            )));
        }
    }

    Ok(ip.to_string())
}

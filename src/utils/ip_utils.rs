//! IP address helpers: parsing host addresses and network prefixes.

use std::net::Ipv4Addr;

use crate::model::HostAddress;

/// Parse a host address such as `10.0.0.1/8` or `10.0.0.1`
///
/// # Arguments
/// * `value` - The address string, with or without a prefix length
/// * `default_prefix` - Prefix length used when `value` carries none
///
/// # Returns
/// * `Ok(HostAddress)` if the address and prefix are valid IPv4
/// * `Err(String)` describing the problem otherwise
///
/// # Examples
/// ```
/// use slicenet::utils::ip_utils::parse_host_address;
///
/// let addr = parse_host_address("10.0.0.1/8", 24).unwrap();
/// assert_eq!(addr.prefix_len, 8);
/// let addr = parse_host_address("10.0.0.2", 24).unwrap();
/// assert_eq!(addr.prefix_len, 24);
/// assert!(parse_host_address("10.0.0.300", 24).is_err());
/// ```
pub fn parse_host_address(value: &str, default_prefix: u8) -> Result<HostAddress, String> {
    let value = value.trim();
    let (ip_part, prefix_part) = match value.split_once('/') {
        Some((ip, prefix)) => (ip, Some(prefix)),
        None => (value, None),
    };

    let ip = ip_part
        .parse::<Ipv4Addr>()
        .map_err(|_| format!("Invalid IPv4 address '{}'", ip_part))?;

    let prefix_len = match prefix_part {
        Some(prefix) => prefix
            .parse::<u8>()
            .ok()
            .filter(|p| *p <= 32)
            .ok_or_else(|| format!("Invalid prefix length '{}' in '{}'", prefix, value))?,
        None => default_prefix,
    };

    Ok(HostAddress::new(ip, prefix_len))
}

/// Parse a network prefix such as `10.0.0.0/8`, rejecting host bits
pub fn parse_network(value: &str) -> Result<HostAddress, String> {
    if !value.contains('/') {
        return Err(format!("Network '{}' is missing a prefix length", value.trim()));
    }
    let network = parse_host_address(value, 32)?;
    if network.ip != network.network() {
        return Err(format!(
            "Network '{}' has host bits set (did you mean {}/{}?)",
            value.trim(),
            network.network(),
            network.prefix_len
        ));
    }
    Ok(network)
}

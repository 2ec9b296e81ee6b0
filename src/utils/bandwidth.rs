//! Bandwidth parsing utilities.
//!
//! Link bandwidths can be given as a bare number of Mbit/s (the convention
//! link emulators use) or as a string with a unit suffix.

use crate::model::Bandwidth;

/// Parse a bandwidth string (e.g., "10Mbit", "1 Mb/s", "1Gbit") to bits/sec
///
/// Supported units (case-insensitive, optional whitespace before the unit):
/// - bits: "bit", "bps", "b/s"
/// - kilobits: "kbit", "kbps", "kb/s"
/// - megabits: "mbit", "mbps", "mb/s"
/// - gigabits: "gbit", "gbps", "gb/s"
///
/// A value without unit is read as Mbit/s.
///
/// # Examples
/// ```
/// use slicenet::utils::bandwidth::parse_bandwidth;
///
/// assert_eq!(parse_bandwidth("10Mbit").unwrap().bits_per_sec(), 10_000_000);
/// assert_eq!(parse_bandwidth("1 Gb/s").unwrap().bits_per_sec(), 1_000_000_000);
/// assert_eq!(parse_bandwidth("2").unwrap().bits_per_sec(), 2_000_000);
/// assert!(parse_bandwidth("fast").is_err());
/// ```
pub fn parse_bandwidth(value: &str) -> Result<Bandwidth, String> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let number: f64 = number
        .parse()
        .map_err(|_| format!("Invalid bandwidth format: {}", trimmed))?;

    let multiplier = match unit.trim().to_lowercase().as_str() {
        "" | "mbit" | "mbps" | "mb/s" => Bandwidth::MBIT,
        "bit" | "bps" | "b/s" => 1,
        "kbit" | "kbps" | "kb/s" => Bandwidth::KBIT,
        "gbit" | "gbps" | "gb/s" => Bandwidth::GBIT,
        other => return Err(format!("Unknown bandwidth unit '{}' in '{}'", other, trimmed)),
    };

    mbit_like_to_bandwidth(number, multiplier)
        .ok_or_else(|| format!("Bandwidth out of range: {}", trimmed))
}

/// Convert a bare Mbit/s figure to a bandwidth
pub fn bandwidth_from_mbit(mbit: f64) -> Result<Bandwidth, String> {
    mbit_like_to_bandwidth(mbit, Bandwidth::MBIT)
        .ok_or_else(|| format!("Bandwidth out of range: {} Mbit/s", mbit))
}

fn mbit_like_to_bandwidth(number: f64, multiplier: u64) -> Option<Bandwidth> {
    let bps = (number * multiplier as f64).round();
    if !bps.is_finite() || bps <= 0.0 || bps > u64::MAX as f64 {
        return None;
    }
    Some(Bandwidth(bps as u64))
}

//! Latency metrics.
//!
//! Reads round-trip samples, either raw `ping` output or one value per
//! line, and summarizes them as min/avg/max with jitter.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// Match: "64 bytes from 10.0.0.4: icmp_seq=1 ttl=64 time=0.512 ms"
static PING_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time[=<]([0-9]+(?:\.[0-9]+)?)\s*ms").expect("Invalid ping time regex"));

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("No latency samples found")]
    Empty,
    #[error("Line {line}: '{content}' is not a latency value")]
    InvalidLine { line: usize, content: String },
    #[error("Latency sample {0} is negative or not a number")]
    InvalidSample(f64),
}

/// Summary statistics of a latency series, all in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub median_ms: f64,
    pub std_dev_ms: f64,
    /// Mean absolute difference between consecutive samples
    pub jitter_ms: f64,
}

/// Summarize a latency series
pub fn summarize(values: &[f64]) -> Result<LatencySummary, MetricsError> {
    if values.is_empty() {
        return Err(MetricsError::Empty);
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(MetricsError::InvalidSample(*bad));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let min_ms = sorted[0];
    let max_ms = sorted[count - 1];
    let avg_ms = sorted.iter().sum::<f64>() / count as f64;

    let median_ms = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    let variance = sorted
        .iter()
        .map(|v| {
            let diff = v - avg_ms;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    let jitter_ms = if count > 1 {
        values.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (count - 1) as f64
    } else {
        0.0
    };

    Ok(LatencySummary {
        samples: count,
        min_ms,
        avg_ms,
        max_ms,
        median_ms,
        std_dev_ms: variance.sqrt(),
        jitter_ms,
    })
}

/// Round-trip times found in `ping` output, in order
pub fn parse_ping_output(text: &str) -> Vec<f64> {
    PING_TIME
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

/// Read samples from `ping` output or from a plain list.
///
/// In a plain list every non-empty line that is not a `#` comment must
/// hold one value, optionally followed by `ms`.
pub fn parse_samples(text: &str) -> Result<Vec<f64>, MetricsError> {
    let from_ping = parse_ping_output(text);
    if !from_ping.is_empty() {
        return Ok(from_ping);
    }

    let mut values = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let number = trimmed.strip_suffix("ms").unwrap_or(trimmed).trim();
        let value = number.parse::<f64>().map_err(|_| MetricsError::InvalidLine {
            line: index + 1,
            content: trimmed.to_string(),
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Human-readable summary
pub fn render_text(summary: &LatencySummary, target: Option<&str>) -> String {
    let mut lines = Vec::new();
    match target {
        Some(target) => lines.push(format!("Latency to {} ({} samples)", target, summary.samples)),
        None => lines.push(format!("Latency ({} samples)", summary.samples)),
    }
    lines.push(format!("  min    {:>10.3} ms", summary.min_ms));
    lines.push(format!("  avg    {:>10.3} ms", summary.avg_ms));
    lines.push(format!("  max    {:>10.3} ms", summary.max_ms));
    lines.push(format!("  median {:>10.3} ms", summary.median_ms));
    lines.push(format!("  stddev {:>10.3} ms", summary.std_dev_ms));
    lines.push(format!("  jitter {:>10.3} ms", summary.jitter_ms));
    lines.join("\n")
}

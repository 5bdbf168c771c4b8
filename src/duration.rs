//! Time arithmetic for Flux literals
//!
//! Durations are converted with fixed approximations (a month is 30 days, a
//! year 365 days); no calendar correction is applied. All values are
//! milliseconds as `f64` so sub-millisecond units keep their fraction.

use crate::ast::{DurationLiteral, DurationUnit, DurationValue};
use chrono::{DateTime, SecondsFormat, Utc};

pub const MS_PER_SECOND: f64 = 1_000.0;
pub const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
pub const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
pub const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

impl DurationUnit {
    /// Approximate length of one unit in milliseconds
    pub fn approx_millis(self) -> f64 {
        match self {
            DurationUnit::Year => 365.0 * MS_PER_DAY,
            DurationUnit::Month => 30.0 * MS_PER_DAY,
            DurationUnit::Week => 7.0 * MS_PER_DAY,
            DurationUnit::Day => MS_PER_DAY,
            DurationUnit::Hour => MS_PER_HOUR,
            DurationUnit::Minute => MS_PER_MINUTE,
            DurationUnit::Second => MS_PER_SECOND,
            DurationUnit::Millisecond => 1.0,
            DurationUnit::Microsecond => 1.0 / 1_000.0,
            DurationUnit::Nanosecond => 1.0 / 1_000_000.0,
        }
    }
}

/// Sum of `magnitude * unit` over every component
pub fn total_millis(values: &[DurationValue]) -> f64 {
    values
        .iter()
        .map(|v| v.magnitude as f64 * v.unit.approx_millis())
        .sum()
}

impl DurationLiteral {
    pub fn millis(&self) -> f64 {
        total_millis(&self.values)
    }
}

/// Parse an RFC 3339 date-time literal into epoch milliseconds
pub fn datetime_millis(value: &str) -> Option<f64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis() as f64)
}

/// Render epoch milliseconds as an RFC 3339 UTC timestamp
pub fn format_instant(millis: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| format!("{}ms", millis))
}

/// Render a millisecond span in Flux duration notation, e.g. `1h5m30s`
pub fn format_millis(millis: f64) -> String {
    if !millis.is_finite() {
        return millis.to_string();
    }

    let sign = if millis < 0.0 { "-" } else { "" };
    let mut rest = millis.abs();
    let mut out = String::new();

    for (unit, size) in [
        ("d", MS_PER_DAY),
        ("h", MS_PER_HOUR),
        ("m", MS_PER_MINUTE),
        ("s", MS_PER_SECOND),
    ] {
        let count = (rest / size).floor();
        if count > 0.0 {
            out.push_str(&format!("{}{}", count, unit));
            rest -= count * size;
        }
    }

    if rest > 0.0 || out.is_empty() {
        out.push_str(&format!("{}ms", rest));
    }

    format!("{}{}", sign, out)
}

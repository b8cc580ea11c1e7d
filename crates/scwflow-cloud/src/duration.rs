//! Wall-clock duration strings (`60s`, `1m`, `1h30m`, `1.5s`, `300ms`)
//!
//! The backend renders durations as `1h0m0s`; users write whatever they like.
//! Both sides go through [`parse_duration`] before being compared.

use crate::error::{CloudError, Result};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<int>\d*)(?:\.(?P<frac>\d*))?(?P<unit>ns|us|µs|μs|ms|s|m|h)")
        .expect("valid duration regex")
});

fn unit_nanos(unit: &str) -> u128 {
    match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        _ => 3_600 * 1_000_000_000,
    }
}

/// Parses a sequence of `<number><unit>` components
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    let invalid = || CloudError::validation(format!("invalid duration {:?}", input));

    if s.is_empty() {
        return Err(invalid());
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.starts_with('-') {
        return Err(CloudError::validation(format!(
            "negative duration {:?} is not allowed",
            input
        )));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut cursor = 0;
    for caps in COMPONENT_RE.captures_iter(s) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != cursor {
            return Err(invalid());
        }
        cursor = whole.end();

        let int = caps.name("int").map(|m| m.as_str()).unwrap_or("");
        let frac = caps.name("frac").map(|m| m.as_str()).unwrap_or("");
        if int.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        let unit = unit_nanos(caps.name("unit").map(|m| m.as_str()).unwrap_or("s"));

        let int_value: u128 = if int.is_empty() { 0 } else { int.parse().map_err(|_| invalid())? };
        total = total
            .checked_add(int_value.checked_mul(unit).ok_or_else(invalid)?)
            .ok_or_else(invalid)?;

        if !frac.is_empty() {
            // Keep at most 18 fractional digits, enough below a nanosecond.
            let frac = &frac[..frac.len().min(18)];
            let scale = 10u128.pow(frac.len() as u32);
            let frac_value: u128 = frac.parse().map_err(|_| invalid())?;
            total = total
                .checked_add(frac_value * unit / scale)
                .ok_or_else(invalid)?;
        }
    }
    if cursor != s.len() {
        return Err(invalid());
    }

    let secs = u64::try_from(total / 1_000_000_000).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total % 1_000_000_000) as u32))
}

fn trim_fraction(value: u128, digits: usize) -> String {
    let s = format!("{:0width$}", value, width = digits);
    s.trim_end_matches('0').to_string()
}

fn with_fraction(whole: u128, frac: u128, digits: usize) -> String {
    let frac = trim_fraction(frac, digits);
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Formats like the backend does: `1h0m0s`, `1m30s`, `1.5s`, `300ms`
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", with_fraction(nanos / 1_000, nanos % 1_000, 3));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", with_fraction(nanos / 1_000_000, nanos % 1_000_000, 6));
    }

    let total_secs = nanos / 1_000_000_000;
    let sub = nanos % 1_000_000_000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = with_fraction(total_secs % 60, sub, 9);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

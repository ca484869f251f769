//! Validation utilities for deployment context values
//!
//! Every check returns a [`ConfigError`] naming the offending field so the
//! operator can fix the context without re-running to find the next problem.

use ipnet::IpNet;

use crate::error::ConfigError;

/// Validate that a required value is present and not blank
///
/// Whitespace-only values count as missing. The returned string is trimmed.
pub fn require_non_empty(value: Option<&str>, field_name: &str) -> Result<String, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::missing(field_name)),
    }
}

/// Parse and validate a CIDR block such as `203.0.113.0/24`
///
/// The prefix is mandatory; a bare address is rejected rather than widened
/// to a host route.
pub fn parse_cidr(value: &str, field_name: &str) -> Result<IpNet, ConfigError> {
    value.parse::<IpNet>().map_err(|e| {
        ConfigError::invalid(
            field_name,
            value,
            format!("{} (expected address/prefix, e.g. 10.0.0.0/16)", e),
        )
    })
}

/// Parse a boolean flag (`true`/`false`, case-insensitive)
pub fn parse_bool_flag(value: &str, field_name: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::invalid(
            field_name,
            value,
            "expected true or false",
        )),
    }
}

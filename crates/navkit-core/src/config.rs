#![forbid(unsafe_code)]

//! Environment-driven configuration helpers.
//!
//! Every navkit config type follows the same shape: a `Default` impl with
//! production values, `from_env()` for the common path,
//! `from_env_with_diagnostics()` returning a [`ConfigParse`] that keeps the
//! rejected values, and `validate()` reporting every violated constraint at
//! once. Parsing is written against a `FnMut(&str) -> Option<String>` lookup
//! so tests can feed a map instead of mutating the process environment.
//!
//! # Failure Modes
//!
//! | Input | Result |
//! |-------|--------|
//! | variable unset | default kept, no error |
//! | unparsable value | default kept, [`ConfigError`] recorded |
//! | parsable but invalid | value kept, reported by `validate()` |

use std::fmt;

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    #[must_use]
    pub fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct ConfigParse<T> {
    pub config: T,
    pub errors: Vec<ConfigError>,
}

impl<T> ConfigParse<T> {
    /// True when every variable parsed cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`).
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[inline]
#[must_use]
pub fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

/// Read a boolean variable into `slot`, recording a parse error on garbage.
pub fn read_bool<F>(get: &mut F, key: &str, field: &'static str, slot: &mut bool, errors: &mut Vec<ConfigError>)
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(value) = get(key) {
        match parse_bool(&value) {
            Some(parsed) => *slot = parsed,
            None => errors.push(ConfigError::new(
                field,
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }
}

/// Read a non-negative integer variable into `slot`.
pub fn read_usize<F>(get: &mut F, key: &str, field: &'static str, slot: &mut usize, errors: &mut Vec<ConfigError>)
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(value) = get(key) {
        match parse_usize(&value) {
            Some(parsed) => *slot = parsed,
            None => errors.push(ConfigError::new(
                field,
                value,
                "expected positive integer",
            )),
        }
    }
}

pub fn validate_positive(field: &'static str, value: usize, errors: &mut Vec<ConfigError>) {
    if value == 0 {
        errors.push(ConfigError::new(field, value.to_string(), "must be >= 1"));
    }
}

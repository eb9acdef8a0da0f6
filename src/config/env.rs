//! Environment variable loading

use std::env;
use std::error::Error;
use std::str::FromStr;

use super::{ServerConfig, merge, validation};

impl ServerConfig {
    /// Load configuration from environment variables only
    ///
    /// Unset variables fall back to defaults. `.env` values are expected to be
    /// loaded into the environment beforehand (see `main.rs`).
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

/// Non-empty, trimmed value of `name`
pub(super) fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse `name` when set
pub(super) fn parse<T>(name: &str) -> Result<Option<T>, Box<dyn Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| format!("Invalid value for {name}: {raw} ({e})").into())
        })
        .transpose()
}

/// Parse a boolean flag: true/false, 1/0, yes/no, on/off
pub(super) fn flag(name: &str) -> Result<Option<bool>, Box<dyn Error>> {
    let Some(raw) = var(name) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(format!("Invalid value for {name}: {raw} (expected true or false)").into()),
    }
}

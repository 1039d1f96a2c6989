use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

pub const ENV_BASE_CURRENCY: &str = "TRACKER_BASE_CURRENCY";
pub const ENV_API_BASE_URL: &str = "TRACKER_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TRACKER_REQUEST_TIMEOUT_SECS";

/// Runtime configuration for the price source and fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Currency every price and value is expressed in (e.g., "USD", "EUR").
    pub base_currency: String,

    /// Root URL of the Coinbase-compatible price API.
    pub api_base_url: String,

    /// Upper bound for each outbound price request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: "USD".to_string(),
            api_base_url: "https://api.coinbase.com".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Defaults overlaid with any `TRACKER_*` environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(currency) = lookup(ENV_BASE_CURRENCY) {
            settings.base_currency = validate_currency(&currency)?;
        }
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "{ENV_API_BASE_URL} must not be empty"
                )));
            }
            settings.api_base_url = url;
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                CoreError::ValidationError(format!(
                    "{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            if secs == 0 {
                return Err(CoreError::ValidationError(format!(
                    "{ENV_REQUEST_TIMEOUT_SECS} must be greater than zero"
                )));
            }
            settings.request_timeout_secs = secs;
        }

        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Currency code must be a 3-letter alphabetic string. Returns it uppercased.
pub fn validate_currency(currency: &str) -> Result<String, CoreError> {
    let trimmed = currency.trim().to_uppercase();
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::ValidationError(format!(
            "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., USD, EUR, PLN)"
        )));
    }
    Ok(trimmed)
}

//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; a bare environment yields a fully local
//! (offline simulation) engine with the default shipping policy.
//!
//! - `MARIGOLD_GATEWAY_URL` - Base URL of the commerce gateway. Absent:
//!   the engine runs in offline simulation mode.
//! - `MARIGOLD_GATEWAY_KEY` - Bearer token for the gateway, if it requires one
//! - `MARIGOLD_GATEWAY_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `MARIGOLD_CURRENCY` - ISO 4217 currency code (default: INR)
//! - `MARIGOLD_FREE_SHIPPING_OVER` - Free-shipping threshold in minor units
//!   (default: 99900, i.e. ₹999.00)
//! - `MARIGOLD_SHIPPING_FEE` - Flat shipping fee in minor units
//!   (default: 4900, i.e. ₹49.00)
//! - `MARIGOLD_PAYMENT_TIMEOUT_SECS` - How long to wait for the payment
//!   widget to confirm (default: 120)

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use marigold_core::{CurrencyCode, Money};

use crate::pricing::ShippingPolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Commerce gateway connection settings.
    pub gateway: GatewayConfig,
    /// Shipping policy applied to every cart.
    pub shipping: ShippingPolicy,
    /// Currency every amount is denominated in.
    pub currency: CurrencyCode,
    /// How long the submitter waits for a payment-widget confirmation.
    pub payment_timeout: Duration,
}

/// Commerce gateway connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway. `None` selects offline simulation mode.
    pub base_url: Option<Url>,
    /// Bearer token presented to the gateway.
    pub api_key: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            shipping: ShippingPolicy::default(),
            currency: CurrencyCode::INR,
            payment_timeout: Duration::from_secs(120),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = match get_optional_env("MARIGOLD_GATEWAY_URL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("MARIGOLD_GATEWAY_URL".to_string(), e.to_string())
            })?),
            None => None,
        };
        let api_key = get_optional_env("MARIGOLD_GATEWAY_KEY").map(SecretString::from);
        let timeout =
            Duration::from_secs(parse_env_or("MARIGOLD_GATEWAY_TIMEOUT_SECS", 10u64)?);

        let currency: CurrencyCode = parse_env_or("MARIGOLD_CURRENCY", CurrencyCode::INR)?;
        let free_over = Money::from_minor(parse_env_or("MARIGOLD_FREE_SHIPPING_OVER", 99_900i64)?);
        let flat_fee = Money::from_minor(parse_env_or("MARIGOLD_SHIPPING_FEE", 4_900i64)?);
        let payment_timeout =
            Duration::from_secs(parse_env_or("MARIGOLD_PAYMENT_TIMEOUT_SECS", 120u64)?);

        Ok(Self {
            gateway: GatewayConfig {
                base_url,
                api_key,
                timeout,
            },
            shipping: ShippingPolicy {
                free_over,
                flat_fee,
            },
            currency,
            payment_timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_offline_mode() {
        let config = EngineConfig::default();
        assert!(config.gateway.base_url.is_none());
        assert_eq!(config.currency, CurrencyCode::INR);
        assert_eq!(config.shipping.free_over, Money::from_minor(99_900));
        assert_eq!(config.shipping.flat_fee, Money::from_minor(4_900));
        assert_eq!(config.payment_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_gateway_config_debug_redacts_key() {
        let config = GatewayConfig {
            base_url: None,
            api_key: Some(SecretString::from("sk_live_very_secret")),
            timeout: Duration::from_secs(10),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_live_very_secret"));
    }
}

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_auth_relay_url")]
    pub auth_relay_url: String,
    #[serde(default)]
    pub checkout: CheckoutSettings,
    #[serde(default)]
    pub polling: PollingSettings,
}

/// Hosted checkout used for new subscriptions and one-time credit packs.
#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutSettings {
    #[serde(default = "default_checkout_url")]
    pub url: String,
    #[serde(default = "default_subscription_price_id")]
    pub subscription_price_id: String,
    #[serde(default = "default_onetime_price_id")]
    pub onetime_price_id: String,
    /// Where the processor sends the browser after success or cancel
    #[serde(default = "default_return_url")]
    pub return_url: String,
}

/// Readiness polling after an upload.
#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "https://api.slidenote.app".to_string()
}

fn default_auth_relay_url() -> String {
    "https://auth.slidenote.app".to_string()
}

fn default_checkout_url() -> String {
    "https://checkout.slidenote.app/session".to_string()
}

fn default_subscription_price_id() -> String {
    "price_monthly_600".to_string()
}

fn default_onetime_price_id() -> String {
    "price_onetime_600".to_string()
}

fn default_return_url() -> String {
    "https://slidenote.app".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_poll_timeout_secs() -> u64 {
    60
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            url: default_checkout_url(),
            subscription_price_id: default_subscription_price_id(),
            onetime_price_id: default_onetime_price_id(),
            return_url: default_return_url(),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("SLIDENOTE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("SLIDENOTE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Parse settings from TOML text without touching the environment.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("backend_url", &self.backend_url),
            ("auth_relay_url", &self.auth_relay_url),
            ("checkout.url", &self.checkout.url),
        ] {
            if url.is_empty() {
                return Err(format!("{} is required", name));
            }
            if !url.starts_with("http") {
                return Err(format!("{} must be a valid HTTP(S) URL", name));
            }
        }
        if self.polling.interval_secs == 0 {
            return Err("polling.interval_secs must be greater than zero".to_string());
        }
        if self.polling.timeout_secs < self.polling.interval_secs {
            return Err("polling.timeout_secs must be at least polling.interval_secs".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_file() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.polling.interval(), Duration::from_secs(5));
        assert_eq!(settings.polling.timeout(), Duration::from_secs(60));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn nested_sections_override_defaults() {
        let settings = Settings::from_toml(
            r#"
            backend_url = "http://localhost:8000"

            [polling]
            interval_secs = 2

            [checkout]
            onetime_price_id = "price_test"
            "#,
        )
        .unwrap();
        assert_eq!(settings.backend_url, "http://localhost:8000");
        assert_eq!(settings.polling.interval_secs, 2);
        assert_eq!(settings.polling.timeout_secs, 60);
        assert_eq!(settings.checkout.onetime_price_id, "price_test");
        assert_eq!(settings.checkout.subscription_price_id, "price_monthly_600");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut settings = Settings::from_toml("").unwrap();
        settings.backend_url = "ftp://nope".into();
        assert!(settings.validate().unwrap_err().contains("backend_url"));

        let mut settings = Settings::from_toml("").unwrap();
        settings.polling.interval_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::from_toml("").unwrap();
        settings.polling.timeout_secs = 1;
        assert!(settings.validate().is_err());
    }
}

//! Configuration module

use std::time::Duration;

use serde::Deserialize;

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poller: PollerConfig,
}

/// Client-credentials grant settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
}

/// Upstream data endpoints, relative to `base_url`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_resources_path")]
    pub resources_path: String,
    #[serde(default = "default_movement_path")]
    pub movement_path: String,
    #[serde(default = "default_availability_path")]
    pub availability_path: String,
    #[serde(default = "default_entrapment_path")]
    pub entrapment_path: String,
    /// `{equipment}` and `{service_order}` are substituted per device
    #[serde(default = "default_service_order_path")]
    pub service_order_path: String,
    #[serde(default = "default_service_order_id")]
    pub service_order_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            resources_path: default_resources_path(),
            movement_path: default_movement_path(),
            availability_path: default_availability_path(),
            entrapment_path: default_entrapment_path(),
            service_order_path: default_service_order_path(),
            service_order_id: default_service_order_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_grant_type() -> String {
    "client_credentials".to_string()
}

fn default_base_url() -> String {
    "https://dev.kone.com".to_string()
}

fn default_resources_path() -> String {
    "/api/v2/application/self/resources".to_string()
}

fn default_movement_path() -> String {
    "/api/v2/equipment/search/movement".to_string()
}

fn default_availability_path() -> String {
    "/api/v2/equipment/search/availability".to_string()
}

fn default_entrapment_path() -> String {
    "/api/v2/equipment/search/entrapment".to_string()
}

fn default_service_order_path() -> String {
    "/api/v1/equipment/{equipment}/serviceOrders/{service_order}".to_string()
}

fn default_service_order_id() -> String {
    "9B0013021111".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    2000
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("LIFTBRIDGE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Rejects empty credentials, a zero poll interval and an unparsable base URL
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("auth.auth_url", &self.auth.auth_url),
            ("auth.client_id", &self.auth.client_id),
            ("auth.client_secret", &self.auth.client_secret),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(BridgeError::Config(format!("{} must not be empty", key)));
            }
        }
        if self.poller.interval_ms == 0 {
            return Err(BridgeError::Config(
                "poller.interval_ms must be positive".to_string(),
            ));
        }
        url::Url::parse(&self.api.base_url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig {
            auth_url: "https://example.test/oauth2/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scope: String::new(),
            grant_type: default_grant_type(),
        }
    }

    #[test]
    fn test_defaults() {
        let api = ApiConfig::default();
        assert_eq!(api.movement_path, "/api/v2/equipment/search/movement");
        assert_eq!(api.timeout(), Duration::from_secs(10));
        assert_eq!(PollerConfig::default().interval(), Duration::from_millis(2000));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let config = Config {
            auth: auth(),
            api: ApiConfig::default(),
            poller: PollerConfig::default(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut a = auth();
        a.client_secret = "  ".to_string();
        let config = Config {
            auth: a,
            api: ApiConfig::default(),
            poller: PollerConfig::default(),
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.client_secret"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = Config {
            auth: auth(),
            api: ApiConfig::default(),
            poller: PollerConfig { interval_ms: 0 },
        };
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let settings = config::Config::builder()
            .set_override("auth.auth_url", "https://example.test/token")
            .unwrap()
            .set_override("auth.client_id", "id")
            .unwrap()
            .set_override("auth.client_secret", "s3cret")
            .unwrap()
            .build()
            .unwrap();
        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.auth.grant_type, "client_credentials");
        assert_eq!(config.poller.interval_ms, 2000);
        assert_eq!(config.api.service_order_id, "9B0013021111");
    }
}

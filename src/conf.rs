use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::fetch::DEFAULT_TIMEOUT;
use crate::logging::LoggingConfig;
use crate::url_builder::DEFAULT_BASE_URL;

pub const ENV_PREFIX: &str = "JOBCLAW";

/// Server settings. Every field can be overridden from the environment,
/// e.g. `JOBCLAW__LISTEN_PORT=9000` or `JOBCLAW__LOGGING__FORMAT=json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub listen_host: String,
    pub listen_port: u16,
    pub base_url: String,
    pub fetch_timeout_ms: u64,
    pub listing_ttl_secs: u64,
    pub recommendations_ttl_secs: u64,
    pub filters_ttl_secs: u64,
    pub respect_robots: bool,
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".into(),
            listen_port: 8080,
            base_url: DEFAULT_BASE_URL.into(),
            fetch_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            listing_ttl_secs: 900,
            recommendations_ttl_secs: 300,
            filters_ttl_secs: 3600,
            respect_robots: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

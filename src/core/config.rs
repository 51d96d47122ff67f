//! Application configuration loaded from environment variables.
use envconfig::Envconfig;
use humantime::Duration;
use reqwest::Url;

use crate::coordinator::Settings;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Envconfig)]
pub struct Config {
    #[allow(dead_code)]
    #[envconfig(from = "APP_LOG", default = "info")]
    pub app_log: String,
    #[allow(dead_code)]
    #[envconfig(from = "APP_LOG_STYLE", default = "always")]
    pub app_log_style: String,
    #[envconfig(from = "HOMEASSISTANT_URL")]
    pub homeassistant_url: Url,
    #[envconfig(from = "HOMEASSISTANT_TOKEN")]
    pub homeassistant_token: String,
    /// Serial number of the aGate, used to name the device and its entities.
    #[envconfig(from = "GATEWAY_ID")]
    pub gateway_id: String,
    /// The local API is polled at `local_scan_interval` instead of `scan_interval`.
    #[envconfig(from = "USE_LOCAL_API", default = "false")]
    pub use_local_api: bool,
    #[envconfig(from = "SCAN_INTERVAL", default = "60s")]
    pub scan_interval: Duration,
    #[envconfig(from = "LOCAL_SCAN_INTERVAL", default = "10s")]
    pub local_scan_interval: Duration,
    #[envconfig(from = "MAX_FAILURES", default = "3")]
    pub max_failures: u32,
    #[envconfig(from = "FETCH_ATTEMPTS", default = "1")]
    pub fetch_attempts: u32,
    #[envconfig(from = "FETCH_RETRY_DELAY", default = "2s")]
    pub fetch_retry_delay: Duration,
    #[envconfig(from = "COMMAND_SETTLE_DELAY", default = "2s")]
    pub command_settle_delay: Duration,
    #[envconfig(from = "SETUP_RETRY_INTERVAL", default = "30s")]
    pub setup_retry_interval: Duration,
}

impl Config {
    /// Polling interval of the coordinator, depending on the API in use.
    pub fn update_interval(&self) -> std::time::Duration {
        if self.use_local_api {
            self.local_scan_interval.into()
        } else {
            self.scan_interval.into()
        }
    }

    pub fn coordinator_settings(&self) -> Settings {
        Settings {
            interval: self.update_interval(),
            max_failures: self.max_failures,
            fetch_attempts: self.fetch_attempts,
            fetch_retry_delay: self.fetch_retry_delay.into(),
        }
    }
}

pub fn configure_logger() {
    let env = env_logger::Env::default()
        .filter_or("APP_LOG", "info")
        .write_style_or("APP_LOG_STYLE", "always");
    // A logger installed by the embedding program takes precedence.
    let _ = env_logger::try_init_from_env(env);
}

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// JWT secret key. When unset, websocket upgrades are not authenticated.
    pub auth_jwt_secret: Option<String>,

    /// Database URL. When unset, the REST form API is disabled.
    pub db_url: Option<String>,

    /// Seconds between websocket keepalive pings
    #[serde(default = "default_ws_ping_interval")]
    pub ws_ping_interval_secs: u64,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Install the loaded configuration as the process-wide instance.
pub fn init_config(config: Config) {
    if CONFIG.set(config).is_err() {
        warn!("Configuration already initialised, keeping existing instance");
    }
}

/// Get the process-wide configuration, falling back to defaults if
/// `init_config` was never called.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "prod" || self.environment.to_lowercase() == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            service_name: default_service_name(),
            auth_jwt_secret: None,
            db_url: None,
            ws_ping_interval_secs: default_ws_ping_interval(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "colab-forms".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_ws_ping_interval() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_local_development() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert!(config.is_development());
        assert!(!config.is_production());
        assert_eq!(config.ws_ping_interval_secs, 15);
        assert!(config.auth_jwt_secret.is_none());
        assert!(config.db_url.is_none());
    }

    #[test]
    fn environment_checks_are_case_insensitive() {
        let config = Config {
            environment: "PROD".to_string(),
            ..Config::default()
        };
        assert!(config.is_production());
        assert!(!config.is_development());
    }
}

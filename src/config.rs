use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Wompi gateway credentials. Empty fields mean the adapter is not enabled.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WompiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub events_secret: String,
}

impl WompiConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.private_key.is_empty()
    }
}

/// Cobre gateway credentials. Empty fields mean the adapter is not enabled.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CobreConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub balance_id: String,
}

impl CobreConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to run database migrations on startup
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
    /// Max lifetime of a pooled connection (seconds)
    #[serde(default = "default_db_max_lifetime_secs")]
    pub db_max_lifetime_secs: u64,

    /// VAT rate applied by the pricing engine, in basis points
    #[serde(default = "default_vat_rate_bps")]
    pub vat_rate_bps: i64,

    /// Platform fee retained on successful payments, in basis points
    #[serde(default = "default_platform_fee_bps")]
    pub platform_fee_bps: i64,

    /// Base URL of the central marketplace application that receives
    /// payment confirmations. Notifications are disabled when unset.
    #[serde(default)]
    pub central_app_url: Option<String>,

    #[serde(default)]
    pub wompi: WompiConfig,

    #[serde(default)]
    pub cobre: CobreConfig,
}

impl AppConfig {
    /// Minimal constructor used by tests and tooling.
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            auto_migrate: true,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_max_lifetime_secs: default_db_max_lifetime_secs(),
            vat_rate_bps: default_vat_rate_bps(),
            platform_fee_bps: default_platform_fee_bps(),
            central_app_url: None,
            wompi: WompiConfig::default(),
            cobre: CobreConfig::default(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    25
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_db_max_lifetime_secs() -> u64 {
    3600
}
fn default_vat_rate_bps() -> i64 {
    1900
}
fn default_platform_fee_bps() -> i64 {
    500
}
fn default_true_bool() -> bool {
    true
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("payments_api={},tower_http=info", level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = fmt().with_env_filter(filter).try_init();
}

/// Well-known environment variables mapped onto config keys. These are the
/// names the deployment environment already exports, so they take precedence
/// over the prefixed `APP__*` form.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("SQL_DATA_SOURCE", "database_url"),
    ("PORT", "port"),
    ("ENVIRONMENT", "environment"),
    ("CENTRAL_APP_URL", "central_app_url"),
    ("WOMPI_BASE_URL", "wompi.base_url"),
    ("WOMPI_PRIVATE_KEY", "wompi.private_key"),
    ("WOMPI_EVENTS_SECRET", "wompi.events_secret"),
    ("COBRE_URL", "cobre.base_url"),
    ("COBRE_API_KEY", "cobre.api_key"),
    ("COBRE_API_SECRET", "cobre.api_secret"),
    ("COBRE_BALANCE_ID", "cobre.balance_id"),
];

/// Loads application configuration.
///
/// Layers configuration sources in this order:
/// 1. Environment-specific config (config/{env}.toml), if present
/// 2. Environment variables (APP__*)
/// 3. Deployment aliases (SQL_DATA_SOURCE, PORT, WOMPI_*, COBRE_*, ...)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("ENVIRONMENT"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    let mut builder = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"));

    for (var, key) in ENV_ALIASES {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(*key, value)?;
        }
    }

    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_pool_sizing_policy() {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            8080,
            "test".to_string(),
        );

        assert_eq!(cfg.db_max_connections, 25);
        assert_eq!(cfg.db_min_connections, 2);
        assert_eq!(cfg.db_max_lifetime_secs, 3600);
        assert_eq!(cfg.vat_rate_bps, 1900);
        assert_eq!(cfg.platform_fee_bps, 500);
    }

    #[test]
    fn gateway_configs_require_credentials() {
        let wompi = WompiConfig::default();
        assert!(!wompi.is_configured());

        let wompi = WompiConfig {
            base_url: "https://sandbox.wompi.co/v1".to_string(),
            private_key: "prv_test_123".to_string(),
            events_secret: "evt_secret".to_string(),
        };
        assert!(wompi.is_configured());

        let cobre = CobreConfig::default();
        assert!(!cobre.is_configured());
    }

    #[test]
    fn production_flag() {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            8080,
            "Production".to_string(),
        );
        assert!(cfg.is_production());
        cfg.environment = "development".to_string();
        assert!(!cfg.is_production());
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::Validate;

const CONFIG_DIR: &str = "config";
const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Payment processor settings.
///
/// The processor hosts the card-payment UI; we create checkout sessions
/// against its REST API and authenticate its completion webhooks with the
/// shared signing secret.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentConfig {
    /// Secret API key used as a bearer token against the processor
    pub secret_key: String,

    /// Shared secret for webhook signature verification
    pub webhook_secret: Option<String>,

    /// Accepted clock skew for signed webhook timestamps (seconds)
    #[serde(default = "default_webhook_tolerance_secs")]
    pub webhook_tolerance_secs: u64,

    /// Base URL of the processor REST API
    #[serde(default = "default_payment_api_base")]
    pub api_base: String,

    /// ISO currency code for checkout sessions
    #[validate(length(equal = 3))]
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Redirect target after a successful hosted payment
    pub success_url: String,

    /// Redirect target after an abandoned/failed hosted payment
    pub cancel_url: String,

    /// Smallest chargeable amount in minor units; totals below this are rejected
    #[serde(default = "default_min_charge_minor_units")]
    pub min_charge_minor_units: i64,
}

fn default_webhook_tolerance_secs() -> u64 {
    300
}
fn default_payment_api_base() -> String {
    "https://api.stripe.com".to_string()
}
fn default_currency() -> String {
    "usd".to_string()
}
fn default_min_charge_minor_units() -> i64 {
    50
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Redis connection URL (webhook replay dedup)
    pub redis_url: String,

    /// JWT secret key
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    pub jwt_expiration: usize,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Directory where uploaded bank slips are written
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Age after which a pending order is marked expired (seconds)
    #[serde(default = "default_pending_order_expiry_secs")]
    pub pending_order_expiry_secs: u64,

    /// Interval between expiry sweeps (seconds)
    #[serde(default = "default_expiry_sweep_interval_secs")]
    pub expiry_sweep_interval_secs: u64,

    /// Payment processor settings
    #[validate]
    pub payment: PaymentConfig,
}

fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_upload_dir() -> String {
    "uploads/bank_slips".to_string()
}
fn default_pending_order_expiry_secs() -> u64 {
    24 * 3600
}
fn default_expiry_sweep_interval_secs() -> u64 {
    15 * 60
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("{0}")]
    Missing(String),
}

/// Loads configuration from `config/{default,<env>}.toml` layered with
/// `APP__`-prefixed environment variables (e.g. `APP__PAYMENT__SECRET_KEY`).
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // jwt_secret and payment.secret_key have no defaults on purpose: they
    // must come from a config file or the environment.
    let builder = Config::builder()
        .set_default("database_url", "sqlite://orchard.db?mode=rwc")?
        .set_default("redis_url", "redis://localhost:6379")?
        .set_default("jwt_expiration", 3600)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("payment.success_url", "http://localhost:5173/payment-success")?
        .set_default("payment.cancel_url", "http://localhost:5173/payment-failed")?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        return Err(AppConfigError::Missing(
            "jwt_secret must be set via config file or APP__JWT_SECRET".to_string(),
        ));
    }
    if config.get_string("payment.secret_key").is_err() {
        return Err(AppConfigError::Missing(
            "payment.secret_key must be set via config file or APP__PAYMENT__SECRET_KEY"
                .to_string(),
        ));
    }

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("orchard_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::try_new(filter_directive)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::services::checkout::CheckoutTimeouts;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_PERSIST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SIDE_EFFECT_TIMEOUT_SECS: u64 = 5;

/// Application configuration, layered from config files and `APP__`
/// environment variables.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL.
    pub database_url: String,

    /// Redis connection URL (realtime admin pushes).
    pub redis_url: String,

    /// Server host address.
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment name.
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON (for log shippers).
    #[serde(default)]
    pub log_json: bool,

    /// Create missing tables from the entity definitions on startup.
    /// Development and test convenience; production schema is managed
    /// out-of-band.
    #[serde(default)]
    pub ensure_schema: bool,

    /// Deadline for the transactional order write, in seconds.
    #[serde(default = "default_persist_timeout")]
    pub persist_timeout_secs: u64,

    /// Deadline for each detached side-effect task, in seconds.
    #[serde(default = "default_side_effect_timeout")]
    pub side_effect_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_persist_timeout() -> u64 {
    DEFAULT_PERSIST_TIMEOUT_SECS
}
fn default_side_effect_timeout() -> u64 {
    DEFAULT_SIDE_EFFECT_TIMEOUT_SECS
}

impl AppConfig {
    pub fn checkout_timeouts(&self) -> CheckoutTimeouts {
        CheckoutTimeouts {
            persist: Duration::from_secs(self.persist_timeout_secs),
            side_effect: Duration::from_secs(self.side_effect_timeout_secs),
        }
    }
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "config directory '{}' not found; using built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("redis_url", "redis://localhost:6379")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{run_env}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    config.try_deserialize()
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("storefront_checkout={level},tower_http=debug");
    let filter = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let registry = tracing_subscriber::registry().with(EnvFilter::new(filter));
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_the_optional_fields() {
        let cfg: AppConfig = Config::builder()
            .set_default("database_url", "sqlite::memory:")
            .unwrap()
            .set_default("redis_url", "redis://localhost:6379")
            .unwrap()
            .set_default("host", "127.0.0.1")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.log_level, DEFAULT_LOG_LEVEL);
        assert!(!cfg.ensure_schema);
        assert_eq!(
            cfg.checkout_timeouts().persist,
            Duration::from_secs(DEFAULT_PERSIST_TIMEOUT_SECS)
        );
    }
}

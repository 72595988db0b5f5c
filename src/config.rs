//! Configuration management for the stockroom core
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with STOCKROOM_ prefix

use chrono::Duration;
use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Cart reservation lifetimes
    #[serde(default)]
    pub reservation: ReservationConfig,

    /// Mechanic order retention
    #[serde(default)]
    pub orders: OrdersConfig,

    /// Outbound Telegram notification destination
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReservationConfig {
    /// How long a cart reservation lives after reserve/heartbeat, in seconds
    pub ttl_seconds: i64,

    /// Rows reserved longer ago than this are hard-deleted on read, in seconds
    pub sweep_after_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrdersConfig {
    /// Orders older than this are eligible for bulk cleanup, in days
    pub retention_days: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    /// Bot API token; notifications are disabled when absent
    pub bot_token: Option<String>,

    /// Destination chat id
    pub chat_id: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("STOCKROOM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("reservation.ttl_seconds", 60)?
            .set_default("reservation.sweep_after_seconds", 3600)?
            .set_default("orders.retention_days", 30)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (STOCKROOM_ prefix)
            .add_source(
                Environment::with_prefix("STOCKROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            reservation: ReservationConfig::default(),
            orders: OrdersConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl ReservationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_seconds)
    }

    pub fn sweep_after(&self) -> Duration {
        Duration::seconds(self.sweep_after_seconds)
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            sweep_after_seconds: 3600,
        }
    }
}

impl OrdersConfig {
    pub fn retention(&self) -> Duration {
        Duration::days(self.retention_days)
    }
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self { retention_days: 30 }
    }
}

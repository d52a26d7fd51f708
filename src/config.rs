// config.rs
use sqlx::types::BigDecimal;
use tracing_subscriber::filter::LevelFilter;

/// Monetary bounds applied by the validation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformLimits {
    pub max_transaction_amount: BigDecimal,
    pub min_hourly_rate: BigDecimal,
    pub max_hourly_rate: BigDecimal,
}

impl Default for PlatformLimits {
    fn default() -> Self {
        Self {
            max_transaction_amount: BigDecimal::from(1_000_000),
            min_hourly_rate: BigDecimal::from(50),
            max_hourly_rate: BigDecimal::from(10_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// When unset the server runs on the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub db_max_connections: u32,
    pub log_level: LevelFilter,
    pub limits: PlatformLimits,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let port = env_or("PORT", 8000u16);
        let db_max_connections = env_or("DB_MAX_CONNECTIONS", 20u32);
        let log_level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|level| level.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::DEBUG);

        let defaults = PlatformLimits::default();
        let limits = PlatformLimits {
            max_transaction_amount: env_or("MAX_TRANSACTION_AMOUNT", defaults.max_transaction_amount),
            min_hourly_rate: env_or("MIN_HOURLY_RATE", defaults.min_hourly_rate),
            max_hourly_rate: env_or("MAX_HOURLY_RATE", defaults.max_hourly_rate),
        };

        Config {
            database_url,
            port,
            db_max_connections,
            log_level,
            limits,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

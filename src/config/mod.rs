//! Configuration module for the QR menu backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Which catalog backend persists dishes, categories and ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// SQLite document tables (default)
    Sqlite,
    /// A single flat JSON file
    Json,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Sqlite => "sqlite",
            StorageKind::Json => "json",
        }
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "db" => Ok(StorageKind::Sqlite),
            "json" | "file" => Ok(StorageKind::Json),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Tunables for the analytics reports and the retention task.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// A dish is trending when its views in the window exceed this
    pub trending_threshold: u64,
    /// Default report window when no start date is given
    pub default_window_days: i64,
    /// Longest window a report may cover
    pub max_window_days: i64,
    /// Default number of dishes in top-N lists
    pub top_dishes_limit: usize,
    /// Events older than this are purged
    pub retention_days: i64,
    /// How often the retention task runs
    pub retention_interval_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trending_threshold: 100,
            default_window_days: 7,
            max_window_days: 366,
            top_dishes_limit: 10,
            retention_days: 365,
            retention_interval_secs: 3600,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret for signing JWTs; authentication is disabled when unset
    pub jwt_secret: Option<String>,
    /// Lifetime of issued tokens
    pub jwt_ttl_hours: i64,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
    /// Optional administrator created at startup
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Catalog backend
    pub storage: StorageKind,
    /// Path to SQLite database file (users, orders, analytics, sqlite catalog)
    pub db_path: PathBuf,
    /// Path to the JSON catalog file
    pub json_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Base URL of the customer menu, encoded into table QR codes
    pub public_url: String,
    /// Seed an empty catalog with the bundled menu
    pub seed: bool,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub analytics: AnalyticsConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());

        let storage = env::var("MENU_STORAGE")
            .unwrap_or_else(|_| "sqlite".to_string())
            .parse()
            .expect("Invalid MENU_STORAGE value");

        let db_path = env::var("MENU_DB_PATH")
            .unwrap_or_else(|_| "./data/menu.sqlite".to_string())
            .into();

        let json_path = env::var("MENU_JSON_PATH")
            .unwrap_or_else(|_| "./data/menu.json".to_string())
            .into();

        let index_path = env::var("MENU_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("MENU_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid MENU_BIND_ADDR format");

        let public_url = env::var("MENU_PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let log_level = env::var("MENU_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = AnalyticsConfig::default();
        let analytics = AnalyticsConfig {
            trending_threshold: parse_or("MENU_TRENDING_THRESHOLD", defaults.trending_threshold),
            default_window_days: parse_or(
                "MENU_ANALYTICS_WINDOW_DAYS",
                defaults.default_window_days,
            ),
            max_window_days: parse_or(
                "MENU_ANALYTICS_MAX_WINDOW_DAYS",
                defaults.max_window_days,
            ),
            top_dishes_limit: parse_or("MENU_TOP_DISHES_LIMIT", defaults.top_dishes_limit),
            retention_days: parse_or("MENU_ANALYTICS_RETENTION_DAYS", defaults.retention_days),
            retention_interval_secs: parse_or(
                "MENU_RETENTION_INTERVAL_SECS",
                defaults.retention_interval_secs,
            ),
        };

        Self {
            jwt_secret,
            jwt_ttl_hours: parse_or("MENU_JWT_TTL_HOURS", 24),
            bcrypt_cost: parse_or("MENU_BCRYPT_COST", bcrypt::DEFAULT_COST),
            admin_email: env::var("MENU_ADMIN_EMAIL").ok(),
            admin_password: env::var("MENU_ADMIN_PASSWORD").ok(),
            storage,
            db_path,
            json_path,
            index_path,
            public_url,
            seed: parse_or("MENU_SEED", true),
            bind_addr,
            log_level,
            analytics,
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset or invalid.
fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {} value '{}': {}, using {}", key, raw, e, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for key in [
            "JWT_SECRET",
            "MENU_STORAGE",
            "MENU_DB_PATH",
            "MENU_JSON_PATH",
            "MENU_INDEX_PATH",
            "MENU_BIND_ADDR",
            "MENU_LOG_LEVEL",
            "MENU_PUBLIC_URL",
            "MENU_TRENDING_THRESHOLD",
            "MENU_ANALYTICS_WINDOW_DAYS",
            "MENU_ANALYTICS_MAX_WINDOW_DAYS",
            "MENU_SEED",
        ] {
            env::remove_var(key);
        }

        let config = Config::from_env();

        assert!(config.jwt_secret.is_none());
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("./data/menu.sqlite"));
        assert_eq!(config.json_path, PathBuf::from("./data/menu.json"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.public_url, "http://localhost:3000");
        assert_eq!(config.log_level, "info");
        assert!(config.seed);
        assert_eq!(config.analytics.trending_threshold, 100);
        assert_eq!(config.analytics.default_window_days, 7);
        assert_eq!(config.analytics.max_window_days, 366);
    }

    #[test]
    fn test_storage_kind_parse() {
        assert_eq!("JSON".parse::<StorageKind>().unwrap(), StorageKind::Json);
        assert_eq!("sqlite".parse::<StorageKind>().unwrap(), StorageKind::Sqlite);
        assert!("mongo".parse::<StorageKind>().is_err());
    }
}

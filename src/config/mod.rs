//! Configuration for the attendance backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Which [`RecordStore`](crate::db::RecordStore) backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    /// Nothing survives a restart.
    Memory,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    pub store: StoreKind,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Admin account created on first start when no admin exists
    pub admin_username: String,
    pub admin_password: String,
    /// Fill an empty store with demo employees and a month of attendance
    pub seed_demo: bool,
}

impl Config {
    /// Load configuration from the environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_psk = lookup("ATTENDANCE_API_PSK").filter(|psk| !psk.is_empty());

        let store = match var("ATTENDANCE_STORE", "sqlite").to_lowercase().as_str() {
            "sqlite" => StoreKind::Sqlite,
            "memory" => StoreKind::Memory,
            other => return Err(format!("Invalid ATTENDANCE_STORE: {}", other)),
        };

        let bind_addr = var("ATTENDANCE_BIND_ADDR", "127.0.0.1:8080")
            .parse()
            .map_err(|e| format!("Invalid ATTENDANCE_BIND_ADDR format: {}", e))?;

        let log_json = match var("ATTENDANCE_LOG_FORMAT", "text").to_lowercase().as_str() {
            "text" => false,
            "json" => true,
            other => return Err(format!("Invalid ATTENDANCE_LOG_FORMAT: {}", other)),
        };

        let seed_demo = matches!(
            var("ATTENDANCE_SEED_DEMO", "false").to_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        Ok(Self {
            api_psk,
            db_path: var("ATTENDANCE_DB_PATH", "./data/attendance.sqlite").into(),
            store,
            bind_addr,
            log_level: var("ATTENDANCE_LOG_LEVEL", "info"),
            log_json,
            admin_username: var("ATTENDANCE_ADMIN_USERNAME", "admin"),
            admin_password: var("ATTENDANCE_ADMIN_PASSWORD", "admin"),
            seed_demo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_with(&[]).unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/attendance.sqlite"));
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.admin_username, "admin");
        assert!(!config.seed_demo);
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("ATTENDANCE_API_PSK", "secret"),
            ("ATTENDANCE_STORE", "Memory"),
            ("ATTENDANCE_BIND_ADDR", "0.0.0.0:9000"),
            ("ATTENDANCE_SEED_DEMO", "true"),
            ("ATTENDANCE_LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.api_psk.as_deref(), Some("secret"));
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.bind_addr.port(), 9000);
        assert!(config.seed_demo);
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_with(&[("ATTENDANCE_STORE", "postgres")]).is_err());
        assert!(config_with(&[("ATTENDANCE_BIND_ADDR", "localhost")]).is_err());
        assert!(config_with(&[("ATTENDANCE_LOG_FORMAT", "xml")]).is_err());
        // An empty key disables auth rather than requiring an empty header
        assert!(config_with(&[("ATTENDANCE_API_PSK", "")])
            .unwrap()
            .api_psk
            .is_none());
    }
}

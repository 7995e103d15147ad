use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::session::DEFAULT_SESSION_TTL_DAYS;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    /// `sqlite://path`, `sqlite::memory:` or a bare file path
    pub url: String,
    /// Insert the demo users and messages into an empty database at startup
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub session: Session,
}

/// Environment variables and the settings keys they override
const ENV_OVERRIDES: [(&str, &str); 5] = [
    ("DATABASE_URL", "database.url"),
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("SESSION_TTL_DAYS", "session.ttl_days"),
    ("SEED_DEMO_DATA", "database.seed_demo_data"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings with environment values supplied by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in warbler-server directory (for development)
        let dev_path = PathBuf::from("warbler-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://warbler.db")?
            .set_default("database.seed_demo_data", false)?
            .set_default("session.ttl_days", DEFAULT_SESSION_TTL_DAYS)?;

        // 2. Override with environment variables (highest priority)
        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session.ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_with(&[]).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.database.url, "sqlite://warbler.db");
        assert!(!settings.database.seed_demo_data);
        assert_eq!(settings.session.ttl_days, DEFAULT_SESSION_TTL_DAYS);
    }

    #[test]
    fn test_environment_overrides() {
        let settings = settings_with(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("SESSION_TTL_DAYS", "7"),
            ("SEED_DEMO_DATA", "true"),
        ])
        .unwrap();

        assert_eq!(settings.database.url, "sqlite::memory:");
        assert_eq!(settings.address(), "127.0.0.1:8080");
        assert_eq!(settings.session_ttl(), chrono::Duration::days(7));
        assert!(settings.database.seed_demo_data);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(settings_with(&[("PORT", "not-a-port")]).is_err());
    }
}

mod authority;
mod server;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub use authority::Authority;
pub use server::ServerConfig;

use crate::error::{Error, Result};

pub const ENV_OVERRIDE_USER: &str = "HALLPASS_OVERRIDE_USER";
pub const ENV_DB: &str = "HALLPASS_DB";
pub const ENV_API_TOKEN: &str = "HALLPASS_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub timeout_ms: u64,
}

impl StoreConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/hallpass.db"),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub authority: Authority,
    pub store: StoreConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Parses a TOML document. Missing sections and fields take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads the file if given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = var(ENV_OVERRIDE_USER) {
            let user = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_OVERRIDE_USER} must be a numeric user id, got '{raw}'"))
            })?;
            self.authority.override_user = Some(user);
        }
        if let Some(path) = var(ENV_DB) {
            self.store.path = PathBuf::from(path);
        }
        if let Some(token) = var(ENV_API_TOKEN) {
            self.server.api_token = Some(token);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.authority, Authority::default());
        assert_eq!(config.store.timeout(), Duration::from_secs(5));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::from_toml(
            r#"
            [authority]
            override_user = 354515
            superuser_group = "admin"

            [store]
            path = "/var/lib/hallpass/bot.db"
            timeout_ms = 250

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert!(config.authority.is_override(354515));
        assert_eq!(config.authority.superuser_group.as_deref(), Some("admin"));
        assert_eq!(config.store.timeout(), Duration::from_millis(250));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml("[authority]\noverride_user = 1").unwrap();
        config
            .apply_env(|key| match key {
                ENV_OVERRIDE_USER => Some("42".to_string()),
                ENV_API_TOKEN => Some("secret".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.authority.override_user, Some(42));
        assert_eq!(config.server.api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_bad_override_user() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == ENV_OVERRIDE_USER).then(|| "bob".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

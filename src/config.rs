use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::models::DirectoryUser;

const DEFAULT_SECRET: &str = "your-secret-key-change-this-in-production";

/// What to do when the counter store cannot be reached: `open` admits the
/// request and skips lockout bookkeeping, `closed` rejects with 503.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    Open,
    Closed,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub lockout: LockoutConfig,
    pub rate_limit: RateLimitConfig,
    pub store: StoreConfig,
    pub directory: DirectoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in seconds.
    pub expiration_secs: u64,
    pub header: String,
    pub prefix: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_secs: 86_400,
            header: "Authorization".to_string(),
            prefix: "Bearer ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Failed attempts before the identity locks.
    pub max_attempts: u64,
    /// Lock window in seconds; refreshed on every failure.
    pub window_secs: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u64,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Redis connection URL; counters stay in process memory when unset.
    pub redis_url: Option<String>,
    pub on_unavailable: FailurePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            on_unavailable: FailurePolicy::Open,
        }
    }
}

/// Accounts seeded into the in-memory directory. A production deployment
/// replaces this with a real identity store.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DirectoryConfig {
    pub users: Vec<DirectoryUser>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt.secret.is_empty() {
            return Err("jwt.secret must not be empty".to_string());
        }
        if self.jwt.expiration_secs == 0 {
            return Err("jwt.expiration_secs must be at least 1".to_string());
        }
        if self.lockout.max_attempts == 0 {
            return Err("lockout.max_attempts must be at least 1".to_string());
        }
        if self.lockout.window_secs == 0 {
            return Err("lockout.window_secs must be at least 1".to_string());
        }
        if self.rate_limit.max_requests == 0 {
            return Err("rate_limit.max_requests must be at least 1".to_string());
        }
        if self.rate_limit.window_secs == 0 {
            return Err("rate_limit.window_secs must be at least 1".to_string());
        }
        Ok(())
    }

    /// Environment variables win over file values for the two secrets that
    /// should not live in a config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.jwt.secret = secret;
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.store.redis_url = Some(url);
        }
    }
}

/// Load configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, String> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

    let config: AppConfig = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse YAML config: {}", e))?;

    Ok(config)
}

/// Load configuration with fallback options: `CONFIG_PATH`, then common
/// file locations, then built-in defaults. Environment overrides and
/// validation apply in every case.
pub fn load_config_with_fallback() -> Result<AppConfig, String> {
    let mut config = None;

    if let Ok(config_path) = std::env::var("CONFIG_PATH") {
        match load_config(&config_path) {
            Ok(c) => config = Some(c),
            Err(e) => warn!(
                "Failed to load config from CONFIG_PATH ({}): {}",
                config_path, e
            ),
        }
    }

    if config.is_none() {
        for path in ["config.yaml", "config.yml"] {
            if Path::new(path).exists() {
                match load_config(path) {
                    Ok(c) => {
                        config = Some(c);
                        break;
                    }
                    Err(e) => warn!("Failed to load config from '{}': {}", path, e),
                }
            }
        }
    }

    let mut config = config.unwrap_or_else(|| {
        info!("No configuration file found; using built-in defaults");
        AppConfig::default()
    });

    config.apply_env_overrides();
    config.validate()?;

    if config.jwt.secret == DEFAULT_SECRET {
        warn!("Using the built-in JWT secret; set JWT_SECRET before deploying");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    #[test]
    fn defaults_match_the_documented_limits() {
        let config = AppConfig::default();
        assert_eq!(config.lockout.max_attempts, 5);
        assert_eq!(config.lockout.window_secs, 300);
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.jwt.header, "Authorization");
        assert_eq!(config.jwt.prefix, "Bearer ");
        assert_eq!(config.store.on_unavailable, FailurePolicy::Open);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let yaml = r#"
jwt:
  secret: "file-secret"
  expiration_secs: 7200
store:
  on_unavailable: closed
directory:
  users:
    - id: 1
      username: admin
      password_hash: "$2b$04$abcdefghijklmnopqrstuv"
      roles: [ADMIN]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.jwt.secret, "file-secret");
        assert_eq!(config.jwt.expiration_secs, 7200);
        assert_eq!(config.jwt.header, "Authorization");
        assert_eq!(config.store.on_unavailable, FailurePolicy::Closed);
        assert_eq!(config.lockout.max_attempts, 5);
        assert_eq!(config.directory.users.len(), 1);
        assert_eq!(config.directory.users[0].roles, vec![UserRole::Admin]);
        assert!(config.directory.users[0].enabled);
    }

    #[test]
    fn validation_rejects_zeroed_limits() {
        let mut config = AppConfig::default();
        config.lockout.max_attempts = 0;
        assert!(config.validate().unwrap_err().contains("max_attempts"));

        let mut config = AppConfig::default();
        config.jwt.secret = String::new();
        assert!(config.validate().unwrap_err().contains("jwt.secret"));
    }
}

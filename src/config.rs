use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::services::stats::AverageBasis;

/// Authentication mode for the application.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// No authentication required. Only reachable through [`UNAUTHENTICATED_MAGIC`].
    Unauthenticated,
    /// Password authentication with an Argon2 hash.
    Password(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub migrations_path: PathBuf,
    pub static_path: PathBuf,
    pub auth_mode: AuthMode,
    pub average_basis: AverageBasis,
    pub currency_symbol: String,
}

/// The magic value that disables authentication.
pub const UNAUTHENTICATED_MAGIC: &str = "DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS";

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "SPENDLOG_PASSWORD_HASH is not set. Set a valid Argon2 hash or '{magic}' \
         to explicitly allow unauthenticated access.",
        magic = UNAUTHENTICATED_MAGIC
    )]
    MissingPasswordHash,

    #[error(
        "SPENDLOG_PASSWORD_HASH must start with '$argon2id$' or be '{magic}'",
        magic = UNAUTHENTICATED_MAGIC
    )]
    InvalidPasswordHash,

    #[error("SPENDLOG_PORT is not a valid port: {0}")]
    InvalidPort(String),

    #[error("SPENDLOG_AVERAGE_BASIS must be 'current-day' or 'selected-month', got '{0}'")]
    InvalidAverageBasis(String),
}

impl Config {
    /// Read configuration from the process environment (after loading `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth_mode = parse_auth_mode(lookup("SPENDLOG_PASSWORD_HASH"))?;

        let port = match lookup("SPENDLOG_PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidPort(p))?,
            None => 7070,
        };

        let average_basis = match lookup("SPENDLOG_AVERAGE_BASIS") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::InvalidAverageBasis(v))?,
            None => AverageBasis::default(),
        };

        Ok(Self {
            host: lookup("SPENDLOG_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database_path: lookup("SPENDLOG_DATABASE_URL")
                .map(|v| {
                    PathBuf::from(
                        v.strip_prefix("sqlite://")
                            .or_else(|| v.strip_prefix("sqlite:"))
                            .unwrap_or(&v),
                    )
                })
                .unwrap_or_else(|| PathBuf::from("data/spendlog.db")),
            migrations_path: lookup("SPENDLOG_MIGRATIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("migrations")),
            static_path: lookup("SPENDLOG_STATIC_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            auth_mode,
            average_basis,
            currency_symbol: lookup("SPENDLOG_CURRENCY_SYMBOL")
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.into()),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn requires_login(&self) -> bool {
        matches!(self.auth_mode, AuthMode::Password(_))
    }
}

fn parse_auth_mode(value: Option<String>) -> Result<AuthMode, ConfigError> {
    match value {
        Some(hash) if hash == UNAUTHENTICATED_MAGIC => Ok(AuthMode::Unauthenticated),
        Some(hash) if hash.starts_with("$argon2id$") => Ok(AuthMode::Password(hash)),
        Some(hash) if hash.is_empty() => Err(ConfigError::MissingPasswordHash),
        Some(_) => Err(ConfigError::InvalidPasswordHash),
        None => Err(ConfigError::MissingPasswordHash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_missing_password_hash_is_an_error() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::MissingPasswordHash);
        assert_eq!(
            config(&[("SPENDLOG_PASSWORD_HASH", "")]).unwrap_err(),
            ConfigError::MissingPasswordHash
        );
    }

    #[test]
    fn test_invalid_password_hash() {
        assert_eq!(
            config(&[("SPENDLOG_PASSWORD_HASH", "hunter2")]).unwrap_err(),
            ConfigError::InvalidPasswordHash
        );
    }

    #[test]
    fn test_explicit_unauthenticated_mode() {
        let cfg = config(&[("SPENDLOG_PASSWORD_HASH", UNAUTHENTICATED_MAGIC)]).unwrap();
        assert!(matches!(cfg.auth_mode, AuthMode::Unauthenticated));
        assert!(!cfg.requires_login());
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("SPENDLOG_PASSWORD_HASH", "$argon2id$v=19$abc")]).unwrap();
        assert!(cfg.requires_login());
        assert_eq!(cfg.address(), "0.0.0.0:7070");
        assert_eq!(cfg.database_path, PathBuf::from("data/spendlog.db"));
        assert_eq!(cfg.average_basis, AverageBasis::CurrentDay);
        assert_eq!(cfg.currency_symbol, "₹");
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("SPENDLOG_PASSWORD_HASH", UNAUTHENTICATED_MAGIC),
            ("SPENDLOG_HOST", "127.0.0.1"),
            ("SPENDLOG_PORT", "8080"),
            ("SPENDLOG_DATABASE_URL", "sqlite:///tmp/x.db"),
            ("SPENDLOG_AVERAGE_BASIS", "selected-month"),
            ("SPENDLOG_CURRENCY_SYMBOL", "€"),
        ])
        .unwrap();
        assert_eq!(cfg.address(), "127.0.0.1:8080");
        assert_eq!(cfg.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.average_basis, AverageBasis::SelectedMonth);
        assert_eq!(cfg.currency_symbol, "€");
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            config(&[("SPENDLOG_PASSWORD_HASH", UNAUTHENTICATED_MAGIC), ("SPENDLOG_PORT", "x")])
                .unwrap_err(),
            ConfigError::InvalidPort("x".into())
        );
        assert_eq!(
            config(&[
                ("SPENDLOG_PASSWORD_HASH", UNAUTHENTICATED_MAGIC),
                ("SPENDLOG_AVERAGE_BASIS", "weekly")
            ])
            .unwrap_err(),
            ConfigError::InvalidAverageBasis("weekly".into())
        );
    }
}

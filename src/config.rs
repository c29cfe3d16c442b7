use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Directory rendered bill images are written to.
    pub bill_storage_dir: PathBuf,
    /// Base of the links handed out for stored bill images.
    pub public_base_url: String,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to
    /// honour a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 8080,
        };
        let bill_storage_dir = lookup("BILL_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./bills"));
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "PUBLIC_BASE_URL",
                value: public_base_url,
            });
        }

        Ok(Config {
            database_url,
            host,
            port,
            bill_storage_dir,
            public_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/dairy")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.bill_storage_dir, PathBuf::from("./bills"));
        assert_eq!(cfg.public_base_url, "http://localhost:8080");
    }

    #[test]
    fn public_base_url_follows_port() {
        let cfg = config(&[("DATABASE_URL", "postgres://x"), ("PORT", "9000")]).unwrap();
        assert_eq!(cfg.public_base_url, "http://localhost:9000");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = config(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".into()
            }
        );
    }

    #[test]
    fn public_base_url_must_be_http() {
        let err = config(&[
            ("DATABASE_URL", "postgres://x"),
            ("PUBLIC_BASE_URL", "ftp://files"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PUBLIC_BASE_URL", .. }));
    }
}

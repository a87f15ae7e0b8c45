use std::str::FromStr;

use anyhow::{bail, Context};
use tracing::Level;

#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_key: String,
    pub host: String,
    pub port: u16,
    pub log_level: Level,
    pub log_format: LogFormat,
    pub init_db_on_start: bool,
}

/// Connection parameters for the PostgreSQL server.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => bail!("unknown log format '{other}'"),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            port: or_default("DB_PORT", "5432")
                .parse()
                .context("DB_PORT must be a valid port number")?,
            user: required("DB_USER")?,
            password: lookup("DB_PASS").unwrap_or_default(),
            name: required("DB_NAME")?,
            max_connections: or_default("DB_MAX_CONNECTIONS", "10")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
        };

        Ok(Self {
            database,
            api_key: required("API_KEY")?,
            host: or_default("HOST", "0.0.0.0"),
            port: or_default("PORT", "5000")
                .parse()
                .context("PORT must be a valid number")?,
            log_level: parse_log_level(&or_default("LOG_LEVEL", "INFO"))
                .context("LOG_LEVEL must be one of TRACE, DEBUG, INFO, WARNING, ERROR")?,
            log_format: or_default("LOG_FORMAT", "json")
                .parse()
                .context("LOG_FORMAT must be json, pretty or compact")?,
            init_db_on_start: parse_bool(&or_default("INIT_DB_ON_START", "false"))
                .context("INIT_DB_ON_START must be a boolean")?,
        })
    }
}

/// Accepts tracing level names plus the `WARNING`/`CRITICAL` spellings
/// common in other logging stacks.
fn parse_log_level(raw: &str) -> anyhow::Result<Level> {
    let normalized = match raw.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    };
    Level::from_str(&normalized).map_err(|_| anyhow::anyhow!("unknown log level '{raw}'"))
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => bail!("'{other}' is not a boolean"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("DB_USER", "postgres"),
        ("DB_HOST", "127.0.0.1"),
        ("DB_NAME", "products_db"),
        ("API_KEY", "s3cret"),
    ];

    #[test]
    fn defaults_applied() {
        let config = Config::from_lookup(lookup_from(MINIMAL)).unwrap();
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.password, "");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.init_db_on_start);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend_from_slice(&[
            ("DB_PORT", "6543"),
            ("DB_PASS", "pw"),
            ("PORT", "8080"),
            ("LOG_LEVEL", "warning"),
            ("LOG_FORMAT", "Pretty"),
            ("INIT_DB_ON_START", "TRUE"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.password, "pw");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.init_db_on_start);
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let pairs: Vec<_> = MINIMAL.iter().copied().filter(|(k, _)| *k != "API_KEY").collect();
        let err = Config::from_lookup(lookup_from(&pairs)).err().unwrap();
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn blank_required_value_is_rejected() {
        let pairs: Vec<_> = MINIMAL
            .iter()
            .map(|&(k, v)| if k == "DB_NAME" { (k, "  ") } else { (k, v) })
            .collect();
        let err = Config::from_lookup(lookup_from(&pairs)).err().unwrap();
        assert!(err.to_string().contains("DB_NAME"));
    }

    #[test]
    fn invalid_port_names_the_variable() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("PORT", "not-a-port"));
        let err = Config::from_lookup(lookup_from(&pairs)).err().unwrap();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn log_level_aliases() {
        assert_eq!(parse_log_level("CRITICAL").unwrap(), Level::ERROR);
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn bool_parsing() {
        assert!(parse_bool("yes").unwrap());
        assert!(parse_bool("On").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::evaluations::EvaluationConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub evaluation: EvaluationConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("APP_PORT", 3000u16)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let defaults = EvaluationConfig::default();
        let evaluation = EvaluationConfig {
            comment_min_length: parse_var("APP_COMMENT_MIN_LENGTH", defaults.comment_min_length)?,
            comment_max_length: parse_var("APP_COMMENT_MAX_LENGTH", defaults.comment_max_length)?,
            max_category_depth: parse_var("APP_CATEGORY_MAX_DEPTH", defaults.max_category_depth)?,
        };
        if evaluation.comment_min_length > evaluation.comment_max_length {
            return Err(ConfigError::InvalidCommentBounds {
                min: evaluation.comment_min_length,
                max: evaluation.comment_max_length,
            });
        }

        if evaluation.max_category_depth == 0 {
            return Err(ConfigError::InvalidCategoryDepth);
        }

        let seed_path = env::var("APP_CATALOG_SEED")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            evaluation,
            catalog: CatalogConfig { seed_path },
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Output layout for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Where the in-memory catalog is hydrated from. `None` means the built-in demo catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidHost { source: std::net::AddrParseError },
    InvalidCommentBounds { min: usize, max: usize },
    InvalidCategoryDepth,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a valid unsigned number (found '{value}')")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCommentBounds { min, max } => write!(
                f,
                "APP_COMMENT_MIN_LENGTH ({min}) must not exceed APP_COMMENT_MAX_LENGTH ({max})"
            ),
            ConfigError::InvalidCategoryDepth => {
                write!(f, "APP_CATEGORY_MAX_DEPTH must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidCommentBounds { .. }
            | ConfigError::InvalidCategoryDepth => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "APP_COMMENT_MIN_LENGTH",
            "APP_COMMENT_MAX_LENGTH",
            "APP_CATEGORY_MAX_DEPTH",
            "APP_CATALOG_SEED",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.evaluation, EvaluationConfig::default());
        assert!(config.catalog.seed_path.is_none());
    }

    #[test]
    fn reads_evaluation_bounds_and_seed_path() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_COMMENT_MIN_LENGTH", "10");
        env::set_var("APP_COMMENT_MAX_LENGTH", "80");
        env::set_var("APP_CATEGORY_MAX_DEPTH", "4");
        env::set_var("APP_CATALOG_SEED", "/srv/catalog.json");
        env::set_var("APP_LOG_FORMAT", "JSON");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.evaluation.comment_min_length, 10);
        assert_eq!(config.evaluation.comment_max_length, 80);
        assert_eq!(config.evaluation.max_category_depth, 4);
        assert_eq!(
            config.catalog.seed_path,
            Some(PathBuf::from("/srv/catalog.json"))
        );
        assert_eq!(config.telemetry.format, LogFormat::Json);
        reset_env();
    }

    #[test]
    fn rejects_inverted_comment_bounds() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_COMMENT_MIN_LENGTH", "50");
        env::set_var("APP_COMMENT_MAX_LENGTH", "5");

        match AppConfig::load() {
            Err(ConfigError::InvalidCommentBounds { min: 50, max: 5 }) => {}
            other => panic!("expected inverted bounds error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_zero_category_depth() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_CATEGORY_MAX_DEPTH", "0");

        match AppConfig::load() {
            Err(ConfigError::InvalidCategoryDepth) => {}
            other => panic!("expected category depth error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "eighty");

        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key: "APP_PORT", .. }) => {}
            other => panic!("expected invalid port, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let server = ServerConfig {
            host: "localhost".to_string(),
            port: 3000,
        };
        let addr = server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }
}

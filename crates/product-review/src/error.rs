use crate::catalog::SeedError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Failures that abort the process or a whole command rather than a single request.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("catalog seed error: {0}")]
    Seed(#[from] SeedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

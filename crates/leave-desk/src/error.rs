use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::leave::NotificationError;
use thiserror::Error;

/// Failures that stop the leave desk process before or while it serves requests.
///
/// Request-level failures never reach this type; the router answers those directly.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging setup failed: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("listener error: {0}")]
    Listener(#[from] std::io::Error),
    #[error("decision mail transport unusable: {0}")]
    MailTransport(#[from] NotificationError),
}

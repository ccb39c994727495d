use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::leave::{FieldRequirements, HeaderStyle, NotificationTemplate, WorkflowConfig};

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
    pub mail: MailConfig,
    pub workflow: WorkflowSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = port_var(&["APP_PORT", "PORT"], 5000)?;
        let port_fallback = flag("APP_PORT_FALLBACK", true)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let transport = match env::var("MAIL_TRANSPORT") {
            Ok(value) => MailTransport::parse(&value)
                .ok_or(ConfigError::InvalidMailTransport { value })?,
            Err(_) => MailTransport::Smtp,
        };
        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let smtp_port = port_var(&["SMTP_PORT"], 465)?;
        let username = non_empty_var("EMAIL_USER");
        let password = non_empty_var("EMAIL_PASS");
        let sender = non_empty_var("EMAIL_FROM")
            .or_else(|| username.clone())
            .unwrap_or_else(|| "leave-desk@localhost".to_string());

        let cell_required = flag("LEAVE_REQUIRE_CELL", true)?;
        let header_style = match env::var("LEAVE_MAIL_HEADER") {
            Ok(value) => {
                HeaderStyle::parse(&value).ok_or(ConfigError::InvalidHeaderStyle { value })?
            }
            Err(_) => HeaderStyle::Plain,
        };
        let signature =
            non_empty_var("LEAVE_MAIL_SIGNATURE").unwrap_or_else(|| "Hostel Warden".to_string());

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                port_fallback,
            },
            telemetry: TelemetryConfig { log_level },
            mail: MailConfig {
                transport,
                smtp_host,
                smtp_port,
                username,
                password,
                sender,
            },
            workflow: WorkflowSettings {
                cell_required,
                header_style,
                signature,
            },
        })
    }

    /// Assemble the service-level settings from the mail and workflow sections.
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            requirements: FieldRequirements {
                cell_required: self.workflow.cell_required,
            },
            sender: self.mail.sender.clone(),
            template: NotificationTemplate {
                header_style: self.workflow.header_style,
                signature: self.workflow.signature.clone(),
                ..NotificationTemplate::default()
            },
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Retry once on the next port when the configured one is taken.
    pub port_fallback: bool,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which gateway delivers decision emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
    Smtp,
    /// Log rendered emails instead of sending them.
    Log,
}

impl MailTransport {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "smtp" => Some(Self::Smtp),
            "log" => Some(Self::Log),
            _ => None,
        }
    }
}

/// Outbound mail settings.
#[derive(Clone)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender: String,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("transport", &self.transport)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("sender", &self.sender)
            .finish()
    }
}

/// Deployment differences in intake and email presentation.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub cell_required: bool,
    pub header_style: HeaderStyle,
    pub signature: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort { name: &'static str, value: String },
    InvalidHost { source: std::net::AddrParseError },
    InvalidMailTransport { value: String },
    InvalidHeaderStyle { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { name, value } => {
                write!(f, "{name} must be a valid u16, got '{value}'")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMailTransport { value } => {
                write!(f, "MAIL_TRANSPORT must be 'smtp' or 'log', got '{value}'")
            }
            ConfigError::InvalidHeaderStyle { value } => {
                write!(f, "LEAVE_MAIL_HEADER must be 'plain' or 'banner', got '{value}'")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// First set variable among `names` parsed as a port; `default` when none is set.
fn port_var(names: &[&'static str], default: u16) -> Result<u16, ConfigError> {
    let Some((name, value)) = names
        .iter()
        .find_map(|name| env::var(name).ok().map(|value| (*name, value)))
    else {
        return Ok(default);
    };
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort { name, value })
}

fn flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(value) = env::var(name) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value }),
    }
}

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::registration::crm::DEFAULT_API_URL;
use crate::workflows::registration::store::DEFAULT_TABLE;
use crate::workflows::registration::{CrmSyncPolicy, SessionPolicy};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

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

/// Top-level configuration for the intake service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub crm: CrmConfig,
    pub store: StoreConfig,
    pub http: HttpClientConfig,
    pub sessions: SessionPolicy,
    /// JSON location catalog replacing the bundled one.
    pub locations_path: Option<PathBuf>,
    /// Endpoint notified with a flat payload after each stored submission.
    pub webhook_url: Option<String>,
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn session_secs(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match optional_var(name) {
        Some(value) => value
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidSessionTtl { name, value }),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let sync = match optional_var("APP_CRM_SYNC") {
            Some(value) => {
                CrmSyncPolicy::parse(&value).ok_or(ConfigError::InvalidCrmSync { value })?
            }
            None => CrmSyncPolicy::default(),
        };
        let crm = CrmConfig {
            access_token: optional_var("HUBSPOT_ACCESS_TOKEN")
                .or_else(|| optional_var("HUBSPOT_PRIVATE_APP_TOKEN")),
            api_url: optional_var("HUBSPOT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            proxy_url: optional_var("APP_CRM_PROXY_URL"),
            sync,
        };

        let store = StoreConfig {
            url: optional_var("APP_STORE_URL"),
            service_key: optional_var("APP_STORE_SERVICE_KEY"),
            table: optional_var("APP_STORE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        };
        if store.url.is_some() != store.service_key.is_some() {
            return Err(ConfigError::IncompleteStore);
        }

        let timeout_secs = match optional_var("APP_HTTP_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout { value })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let defaults = SessionPolicy::default();
        let sessions = SessionPolicy {
            idle_timeout: session_secs("APP_SESSION_IDLE_SECS", defaults.idle_timeout)?,
            submitted_retention: session_secs(
                "APP_SESSION_RETENTION_SECS",
                defaults.submitted_retention,
            )?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            crm,
            store,
            http: HttpClientConfig {
                timeout: Duration::from_secs(timeout_secs),
            },
            sessions,
            locations_path: optional_var("APP_LOCATIONS_PATH").map(PathBuf::from),
            webhook_url: optional_var("APP_WEBHOOK_URL"),
        })
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// CRM credentials and sync behaviour.
#[derive(Clone)]
pub struct CrmConfig {
    pub access_token: Option<String>,
    pub api_url: String,
    /// When set, submissions reach the CRM through this proxy instead of the token.
    pub proxy_url: Option<String>,
    pub sync: CrmSyncPolicy,
}

impl fmt::Debug for CrmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("proxy_url", &self.proxy_url)
            .field("sync", &self.sync)
            .finish()
    }
}

/// Primary store endpoint. Without a URL the service keeps rows in memory.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub table: String,
}

impl StoreConfig {
    /// URL and key, when both are configured.
    pub fn remote(&self) -> Option<(&str, &str)> {
        match (&self.url, &self.service_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("table", &self.table)
            .finish()
    }
}

/// Outbound HTTP client settings shared by the store and CRM clients.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCrmSync { value: String },
    InvalidTimeout { value: String },
    InvalidSessionTtl { name: &'static str, value: String },
    IncompleteStore,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCrmSync { value } => write!(
                f,
                "APP_CRM_SYNC must be one of best_effort, required, disabled (got '{value}')"
            ),
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "APP_HTTP_TIMEOUT_SECS must be a positive number of seconds (got '{value}')"
            ),
            ConfigError::InvalidSessionTtl { name, value } => write!(
                f,
                "{name} must be a positive number of seconds (got '{value}')"
            ),
            ConfigError::IncompleteStore => write!(
                f,
                "APP_STORE_URL and APP_STORE_SERVICE_KEY must be set together"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCrmSync { .. }
            | ConfigError::InvalidTimeout { .. }
            | ConfigError::InvalidSessionTtl { .. }
            | ConfigError::IncompleteStore => None,
        }
    }
}

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::workflows::documents::{EncryptionKey, UploadPolicy};
use crate::workflows::listings::MatchingConfig;

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
    pub lifecycle: LifecycleConfig,
    pub documents: DocumentConfig,
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

        let defaults = LifecycleConfig::default();
        let lifecycle = LifecycleConfig {
            nda_validity_days: read_bounded(
                "NDA_VALIDITY_DAYS",
                defaults.nda_validity_days,
                VALIDITY_DAYS,
            )?,
            listing_validity_days: read_bounded(
                "LISTING_VALIDITY_DAYS",
                defaults.listing_validity_days,
                VALIDITY_DAYS,
            )?,
            matching: MatchingConfig {
                visibility_threshold: read_bounded(
                    "MATCH_VISIBILITY_THRESHOLD",
                    defaults.matching.visibility_threshold,
                    MATCH_SCORE,
                )?,
                notification_threshold: read_bounded(
                    "MATCH_NOTIFY_THRESHOLD",
                    defaults.matching.notification_threshold,
                    MATCH_SCORE,
                )?,
            },
        };

        let (encryption_key, ephemeral_key) = match env::var("DOCUMENT_ENCRYPTION_KEY") {
            Ok(raw) if !raw.trim().is_empty() => {
                let key = EncryptionKey::from_hex(raw.trim())
                    .map_err(|_| ConfigError::InvalidEncryptionKey)?;
                (key, false)
            }
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingEncryptionKey)
            }
            _ => (EncryptionKey::generate(), true),
        };

        let upload_defaults = UploadPolicy::default();
        let documents = DocumentConfig {
            encryption_key,
            ephemeral_key,
            max_upload_bytes: read_number(
                "DOCUMENT_MAX_UPLOAD_BYTES",
                upload_defaults.max_bytes,
            )?,
            storage_timeout: Duration::from_secs(read_number(
                "DOCUMENT_STORAGE_TIMEOUT_SECS",
                upload_defaults.storage_timeout.as_secs(),
            )?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
                include_targets: false,
            },
            lifecycle,
            documents,
        })
    }
}

fn read_number<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        _ => Ok(default),
    }
}

/// Validity windows run from one day to ten years.
const VALIDITY_DAYS: RangeInclusive<i64> = 1..=3650;
/// Match scores never exceed 100.
const MATCH_SCORE: RangeInclusive<u8> = 0..=100;

fn read_bounded<T: std::str::FromStr + PartialOrd>(
    var: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError> {
    let value = read_number(var, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber { var })
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
    pub ansi: bool,
    pub include_targets: bool,
}

/// Windows and thresholds applied across the disclosure lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub nda_validity_days: i64,
    pub listing_validity_days: i64,
    pub matching: MatchingConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            nda_validity_days: 30,
            listing_validity_days: 180,
            matching: MatchingConfig::default(),
        }
    }
}

/// Document custody settings. The key is process-wide and never stored per document.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub encryption_key: EncryptionKey,
    pub ephemeral_key: bool,
    pub max_upload_bytes: usize,
    pub storage_timeout: Duration,
}

impl DocumentConfig {
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.max_upload_bytes,
            storage_timeout: self.storage_timeout,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
    InvalidEncryptionKey,
    MissingEncryptionKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a number within its allowed range")
            }
            ConfigError::InvalidEncryptionKey => {
                write!(f, "DOCUMENT_ENCRYPTION_KEY must be 64 hex characters")
            }
            ConfigError::MissingEncryptionKey => {
                write!(f, "DOCUMENT_ENCRYPTION_KEY is required in production")
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

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "CarePulse";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address of the HTTP API.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default timeout for backend HTTP calls.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    "info,carepulse_lib=debug".to_string()
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Appwrite,
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "appwrite" => Ok(Self::Appwrite),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid {
                name: "CAREPULSE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub database_id: String,
}

/// Collection ids the services read and write.
#[derive(Debug, Clone, PartialEq)]
pub struct Collections {
    pub patients: String,
    pub appointments: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            patients: "patients".into(),
            appointments: "appointments".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub backend: BackendKind,
    pub appwrite: AppwriteSettings,
    pub collections: Collections,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Read configuration from the process environment, after loading `.env`
    /// when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Backend credentials are only
    /// required when the hosted backend is selected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_raw = get("CAREPULSE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "CAREPULSE_BIND",
            value: bind_raw.clone(),
        })?;

        let http_timeout_secs = match get("CAREPULSE_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "CAREPULSE_HTTP_TIMEOUT_SECS",
                value: raw,
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let backend = match get("CAREPULSE_BACKEND") {
            Some(raw) => raw.parse()?,
            None if get("ENDPOINT").is_some() => BackendKind::Appwrite,
            None => BackendKind::Memory,
        };

        let required = |name: &'static str| -> Result<String, ConfigError> {
            match backend {
                BackendKind::Appwrite => get(name).ok_or(ConfigError::Missing(name)),
                BackendKind::Memory => Ok(get(name).unwrap_or_default()),
            }
        };

        let appwrite = AppwriteSettings {
            endpoint: required("ENDPOINT")?,
            project_id: required("PROJECT_ID")?,
            api_key: required("API_KEY")?,
            database_id: required("DATABASE_ID")?,
        };

        let defaults = Collections::default();
        let collections = Collections {
            patients: get("PATIENT_COLLECTION_ID").unwrap_or(defaults.patients),
            appointments: get("APPOINTMENT_COLLECTION_ID").unwrap_or(defaults.appointments),
        };

        Ok(Self {
            bind,
            backend,
            appwrite,
            collections,
            http_timeout_secs,
        })
    }
}

use std::path::PathBuf;

use axum::http::HeaderValue;

/// Bytes in one mebibyte.
const MIB: usize = 1024 * 1024;

/// Which [`ReportStore`](crowdalert_db::store::ReportStore) backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Outbound geocoding collaborator settings.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be {expected} (got '{value}')")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields except `DATABASE_URL` (when using PostgreSQL) have defaults
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Where report images are written and served from.
    pub upload_dir: PathBuf,
    /// Request body limit; bounds the single image per report.
    pub max_upload_bytes: usize,
    pub store: StoreBackend,
    pub database_max_connections: u32,
    pub geocoder: GeocoderConfig,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default                               |
    /// |----------------------------|---------------------------------------|
    /// | `HOST`                     | `0.0.0.0`                             |
    /// | `PORT`                     | `5000`                                |
    /// | `CORS_ORIGINS`             | `http://localhost:3000`               |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                                  |
    /// | `UPLOAD_DIR`               | `static/uploads`                      |
    /// | `MAX_UPLOAD_BYTES`         | `10485760`                            |
    /// | `STORE_BACKEND`            | `postgres` (or `memory`)              |
    /// | `DATABASE_URL`             | required for `postgres`               |
    /// | `DATABASE_MAX_CONNECTIONS` | `20`                                  |
    /// | `GEOCODER_ENABLED`         | `true`                                |
    /// | `GEOCODER_URL`             | `https://nominatim.openstreetmap.org` |
    /// | `GEOCODER_TIMEOUT_SECS`    | `10`                                  |
    /// | `LOG_FORMAT`               | `pretty` (or `json`)                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");
        let port = parse(&lookup, "PORT", "5000", "a valid port number")?;

        let cors_origins = var("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|origin| {
                // Credentialed CORS cannot use a wildcard origin.
                let parsed = (origin != "*").then(|| origin.parse::<HeaderValue>().ok()).flatten();
                parsed.ok_or_else(|| ConfigError::Invalid {
                    name: "CORS_ORIGINS",
                    value: origin.to_string(),
                    expected: "a comma-separated list of origins",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let request_timeout_secs = parse(&lookup, "REQUEST_TIMEOUT_SECS", "30", "a whole number of seconds")?;
        let upload_dir = PathBuf::from(var("UPLOAD_DIR", "static/uploads"));
        let max_upload_bytes = parse(
            &lookup,
            "MAX_UPLOAD_BYTES",
            &(10 * MIB).to_string(),
            "a byte count",
        )?;

        let store = match var("STORE_BACKEND", "postgres").to_ascii_lowercase().as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                    expected: "'postgres' or 'memory'",
                })
            }
        };
        let database_max_connections =
            parse(&lookup, "DATABASE_MAX_CONNECTIONS", "20", "a connection count")?;

        let geocoder = GeocoderConfig {
            enabled: parse(&lookup, "GEOCODER_ENABLED", "true", "'true' or 'false'")?,
            base_url: var("GEOCODER_URL", crowdalert_geocode::DEFAULT_BASE_URL),
            timeout_secs: parse(&lookup, "GEOCODER_TIMEOUT_SECS", "10", "a whole number of seconds")?,
        };

        let log_format = match var("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                    expected: "'pretty' or 'json'",
                })
            }
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_dir,
            max_upload_bytes,
            store,
            database_max_connections,
            geocoder,
            log_format,
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value,
        expected,
    })
}

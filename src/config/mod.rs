//! Configuration management.
//!
//! Configuration comes from a TOML file (every key optional) with
//! environment variable overrides applied on top. Missing values fall back
//! to built-in defaults: listen on `0.0.0.0:8080`, store records in
//! `geolog.db`, collapse store failures into 404/422.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http::ErrorPolicy;
use crate::services::ValidationPolicy;
use crate::{Error, Result};

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default metrics listen port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Main configuration for geolog.
#[derive(Debug, Clone, Default)]
pub struct GeologConfig {
    /// HTTP listener settings.
    pub server: ServerSettings,
    /// Record store settings.
    pub database: DatabaseSettings,
    /// Status-code mapping policy.
    pub error_policy: ErrorPolicy,
    /// Create-time validation rules.
    pub validation: ValidationPolicy,
    /// Logging and metrics settings, resolved by [`crate::observability`].
    pub observability: ObservabilitySettings,
    /// Config files that were loaded.
    pub config_sources: Vec<PathBuf>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerSettings {
    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| Error::operation("parse_listen_host", format!("'{}': {e}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Record store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Path of the `SQLite` database file; `:memory:` for an ephemeral store.
    pub path: PathBuf,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("geolog.db"),
            busy_timeout_ms: 5000,
        }
    }
}

impl DatabaseSettings {
    /// Returns the busy timeout as a [`Duration`].
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Observability settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ObservabilitySettings {
    /// Logging section.
    pub logging: Option<LoggingSettings>,
    /// Metrics section.
    pub metrics: Option<MetricsSettings>,
}

/// `[observability.logging]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive, e.g. `info` or `geolog=debug,tower_http=info`.
    pub level: Option<String>,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// `[observability.metrics]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MetricsSettings {
    /// Whether to install the Prometheus recorder.
    pub enabled: Option<bool>,
    /// Port for the Prometheus scrape endpoint.
    pub port: Option<u16>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// `[server]` section.
    pub server: Option<ConfigFileServer>,
    /// `[database]` section.
    pub database: Option<ConfigFileDatabase>,
    /// `[http]` section.
    pub http: Option<ConfigFileHttp>,
    /// `[validation]` section.
    pub validation: Option<ConfigFileValidation>,
    /// `[observability]` section.
    pub observability: Option<ObservabilitySettings>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileServer {
    /// Interface to bind.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
}

/// Database section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDatabase {
    /// Database file path.
    pub path: Option<String>,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u64>,
}

/// HTTP section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileHttp {
    /// `faithful` or `distinct`.
    pub error_policy: Option<String>,
}

/// Validation section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileValidation {
    /// Enforce coordinate ranges on create.
    pub strict_coordinates: Option<bool>,
}

impl GeologConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::operation("read_config_file", format!("{}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        config.config_sources.push(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `<platform config dir>/geolog/config.toml`, then
    /// `~/.config/geolog/config.toml`. Returns defaults if neither exists or
    /// parses.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("geolog").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("geolog")
                .join("config.toml"),
        ];

        for path in &candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring config file"),
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `GeologConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
        }
        if let Some(database) = file.database {
            if let Some(path) = database.path {
                config.database.path = PathBuf::from(path);
            }
            if let Some(timeout) = database.busy_timeout_ms {
                config.database.busy_timeout_ms = timeout;
            }
        }
        if let Some(policy) = file.http.and_then(|http| http.error_policy) {
            config.error_policy = ErrorPolicy::parse(&policy);
        }
        if let Some(strict) = file.validation.and_then(|v| v.strict_coordinates) {
            config.validation.strict_coordinates = strict;
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        config
    }

    /// Applies `GEOLOG_*` environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `GEOLOG_HOST`, `GEOLOG_PORT`, `GEOLOG_DATABASE_PATH`,
    /// `GEOLOG_ERROR_POLICY`, `GEOLOG_STRICT_COORDINATES`. Empty and
    /// unparsable values are ignored.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(host) = get("GEOLOG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("GEOLOG_PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(path) = get("GEOLOG_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(policy) = get("GEOLOG_ERROR_POLICY") {
            self.error_policy = ErrorPolicy::parse(&policy);
        }
        if let Some(strict) = get("GEOLOG_STRICT_COORDINATES") {
            self.validation.strict_coordinates = parse_bool(&strict);
        }

        self
    }

    /// Sets the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = path.into();
        self
    }
}

/// Parses the boolean spellings accepted in environment variables.
pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

//! Configuration management.
//!
//! Configuration is read from a TOML file whose fields are all optional;
//! anything left out keeps its default. A few environment variables override
//! the file so containers can be configured without one.

use crate::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "GROUND_EXPORT_CONFIG_PATH";
/// Environment variable overriding the HTTP bind address.
pub const BIND_ENV: &str = "GROUND_EXPORT_BIND";
/// Environment variable overriding the snapshot path.
pub const DATA_ENV: &str = "GROUND_EXPORT_DATA";

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 8080);
const DEFAULT_STREAM_BUFFER: usize = 32;

/// Main configuration.
#[derive(Debug, Clone, Default)]
pub struct GroundExportConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Path to the JSON snapshot backing the document store.
    pub snapshot_path: Option<PathBuf>,
    /// Export engine settings.
    pub export: ExportSettings,
    /// Logging and metrics settings.
    pub observability: ObservabilitySettings,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,
    /// Number of encoded chunks buffered between the exporter and the client.
    pub stream_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(DEFAULT_BIND),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

/// Which form of a layer drives the element columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormSelection {
    /// Use the first form in document order.
    #[default]
    First,
    /// Require exactly one form; several forms fail the export.
    Single,
}

impl FromStr for FormSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "single" | "strict" => Ok(Self::Single),
            other => Err(Error::InvalidInput(format!(
                "unknown form selection policy '{other}' (expected 'first' or 'single')"
            ))),
        }
    }
}

/// Export engine settings.
#[derive(Debug, Clone, Copy)]
pub struct ExportSettings {
    /// Form selection policy.
    pub form_selection: FormSelection,
    /// Issue the feature and observation reads concurrently.
    pub parallel_fetch: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            form_selection: FormSelection::First,
            parallel_fetch: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format string, falling back to pretty output.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging and metrics settings.
#[derive(Debug, Clone, Default)]
pub struct ObservabilitySettings {
    /// Log format.
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    /// Serve Prometheus metrics on this address.
    pub metrics_listen: Option<SocketAddr>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Store section.
    pub store: Option<ConfigFileStore>,
    /// Export section.
    pub export: Option<ConfigFileExport>,
    /// Observability section.
    pub observability: Option<ConfigFileObservability>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileServer {
    /// Bind address.
    pub bind: Option<String>,
    /// Stream buffer size in chunks.
    pub stream_buffer: Option<usize>,
}

/// Store section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStore {
    /// Snapshot file path.
    pub snapshot_path: Option<String>,
}

/// Export section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileExport {
    /// Form selection policy.
    pub form_selection: Option<String>,
    /// Parallel bulk reads.
    pub parallel_fetch: Option<bool>,
}

/// Observability section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileObservability {
    /// Log format.
    pub log_format: Option<String>,
    /// Log filter.
    pub log_filter: Option<String>,
    /// Log file.
    pub log_file: Option<String>,
    /// Metrics listen address.
    pub metrics_listen: Option<String>,
}

impl GroundExportConfig {
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
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or holds invalid values.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir, then `~/.config/ground-export/`.
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs
                .config_dir()
                .join("ground-export")
                .join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("ground-export")
                .join("config.toml"),
        ];
        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.display(),
                        error = %e,
                        "Ignoring unreadable config file"
                    );
                },
            }
        }

        Self::default()
    }

    /// Resolves configuration the way the binary does.
    ///
    /// An explicit path wins, then [`CONFIG_PATH_ENV`], then the default
    /// location. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded or an
    /// override holds an invalid value.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = path {
            Self::load_from_file(path)?
        } else {
            match std::env::var(CONFIG_PATH_ENV) {
                Ok(env_path) if !env_path.trim().is_empty() => {
                    Self::load_from_file(Path::new(&env_path))?
                },
                _ => Self::load_default(),
            }
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies environment overrides using the given lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind override is not a socket address.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.server.bind = parse_addr(BIND_ENV, &bind)?;
        }
        if let Some(data) = lookup(DATA_ENV).filter(|v| !v.trim().is_empty()) {
            self.snapshot_path = Some(PathBuf::from(data));
        }
        Ok(self)
    }

    /// Converts a `ConfigFile` to `GroundExportConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(server) = file.server {
            if let Some(bind) = server.bind {
                config.server.bind = parse_addr("server.bind", &bind)?;
            }
            if let Some(buffer) = server.stream_buffer {
                if buffer == 0 {
                    return Err(Error::InvalidInput(
                        "server.stream_buffer must be at least 1".to_string(),
                    ));
                }
                config.server.stream_buffer = buffer;
            }
        }
        if let Some(store) = file.store {
            config.snapshot_path = store.snapshot_path.map(PathBuf::from);
        }
        if let Some(export) = file.export {
            if let Some(policy) = export.form_selection {
                config.export.form_selection = policy.parse()?;
            }
            if let Some(parallel) = export.parallel_fetch {
                config.export.parallel_fetch = parallel;
            }
        }
        if let Some(obs) = file.observability {
            if let Some(format) = obs.log_format {
                config.observability.log_format = LogFormat::parse(&format);
            }
            config.observability.log_filter = obs.log_filter;
            config.observability.log_file = obs.log_file.map(PathBuf::from);
            if let Some(addr) = obs.metrics_listen {
                config.observability.metrics_listen =
                    Some(parse_addr("observability.metrics_listen", &addr)?);
            }
        }

        Ok(config)
    }

    /// Sets the snapshot path.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub const fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.server.bind = bind;
        self
    }
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::InvalidInput(format!("{field}: invalid address '{value}': {e}")))
}

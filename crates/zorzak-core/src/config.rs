/// Dashboard configuration.
///
/// Every field has a default, so an empty JSON object (or no file at all)
/// is a valid configuration. Example:
///
/// ```json
/// {
///   "ports": { "min": 8080, "max": 8180 },
///   "launch": { "timeout_ms": 10000, "poll_interval_ms": 100 },
///   "backend": {
///     "program": "snakeviz",
///     "args": ["--server", "--port", "{port}", "--hostname", "{host}", "{file}"],
///     "host": "127.0.0.1"
///   }
/// }
/// ```
use crate::launcher::LaunchOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub ports: PortRange,
    pub launch: LaunchSettings,
    pub backend: BackendConfig,
}

/// Half-open range `[min, max)` searched for backend ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            min: 8080,
            max: 8180,
        }
    }
}

/// How long to wait for a backend to report its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        // SnakeViz needs a moment to import and bind before printing its URL.
        Self {
            timeout_ms: 10_000,
            poll_interval_ms: 100,
        }
    }
}

impl LaunchSettings {
    pub fn options(&self) -> LaunchOptions {
        LaunchOptions::new(
            Duration::from_millis(self.timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}

/// The external visualization backend.
///
/// `args` are templates: `{file}`, `{port}` and `{host}` are substituted
/// per launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub program: String,
    pub args: Vec<String>,
    pub host: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: "snakeviz".to_owned(),
            args: ["--server", "--port", "{port}", "--hostname", "{host}", "{file}"]
                .into_iter()
                .map(String::from)
                .collect(),
            host: "127.0.0.1".to_owned(),
        }
    }
}

impl DashboardConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// [`load`](Self::load) `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ports.min >= self.ports.max {
            return Err(ConfigError::Invalid(format!(
                "port range {}..{} is empty",
                self.ports.min, self.ports.max
            )));
        }
        if self.launch.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "launch.poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.backend.program.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.program is empty".into()));
        }
        Ok(())
    }
}

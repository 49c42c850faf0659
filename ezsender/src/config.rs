//! Configuration loading.
//!
//! ```ron
//! Ezsender (
//!     dispatch: (batch_size: 10),
//!     retry: (max_retries: 3, base_delay_ms: 1000),
//!     circuit_breaker: (failure_threshold: 5, success_threshold: 2, open_timeout_secs: 30),
//!     template: (
//!         from: "Ops <ops@example.com>",
//!         subject: "Test Email",
//!         body: "Hello {{name}}, this is a test email!",
//!     ),
//!     mailer: Smtp((host: "smtp.example.com")),
//!     source: Some("recipients.csv"),
//! )
//! ```

use std::{
    io,
    path::{Path, PathBuf},
};

use ezsender_dispatch::{CircuitBreakerConfig, DispatchConfig, RetryPolicy};
use ezsender_mail::{MailerConfig, TemplateConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "EZSENDER_CONFIG";

/// Locations searched, in order, when neither a path nor [`CONFIG_ENV`] is given
pub const DEFAULT_PATHS: [&str; 2] = [
    "./ezsender.config.ron",
    "/etc/ezsender/ezsender.config.ron",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("No configuration file found. Tried:\n{tried}")]
    NotFound { tried: String },

    #[error("Invalid configuration:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Ezsender")]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    pub template: TemplateConfig,

    #[serde(default)]
    pub mailer: MailerConfig,

    /// CSV file used when none is given on the command line
    #[serde(default)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Read and parse the configuration at `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not valid RON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check everything serde cannot, reporting every problem at once.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] listing each problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let problems: Vec<String> = [
            self.dispatch.validate(),
            self.retry.validate(),
            self.circuit_breaker.validate(),
            self.template.validate(),
            self.mailer.validate(&self.template),
        ]
        .into_iter()
        .flatten()
        .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

/// Find the configuration file using the following precedence:
/// 1. `explicit`, normally from the command line
/// 2. `EZSENDER_CONFIG` environment variable
/// 3. ./ezsender.config.ron (current working directory)
/// 4. /etc/ezsender/ezsender.config.ron (system-wide config)
///
/// Returns `Ok(None)` if only the default locations were searched and none
/// of them exist.
///
/// # Errors
///
/// If `explicit` or `EZSENDER_CONFIG` names a file that does not exist.
pub fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let candidates = DEFAULT_PATHS.map(PathBuf::from);
    discover(
        explicit,
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        &candidates,
    )
}

fn discover(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    candidates: &[PathBuf],
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(Some(path.to_path_buf()))
        } else {
            Err(ConfigError::NotFound {
                tried: format!("  - {}", path.display()),
            })
        };
    }

    if let Some(path) = from_env {
        return if path.exists() {
            Ok(Some(path))
        } else {
            Err(ConfigError::NotFound {
                tried: format!("  - {CONFIG_ENV}={}", path.display()),
            })
        };
    }

    Ok(candidates.iter().find(|path| path.exists()).cloned())
}

/// The `NotFound` error for when no file exists at any default location
pub fn not_found() -> ConfigError {
    let tried = std::iter::once(format!("  - {CONFIG_ENV} environment variable"))
        .chain(DEFAULT_PATHS.iter().map(|p| format!("  - {p}")))
        .collect::<Vec<_>>()
        .join("\n");

    ConfigError::NotFound { tried }
}

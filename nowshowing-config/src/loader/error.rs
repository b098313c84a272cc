//! Errors raised while loading configuration.

use std::path::PathBuf;
use thiserror::Error;

use crate::{
    credentials::CredentialError, models::sources::FileConfigParseError,
    validation::ConfigGuardRailError,
};

/// Anything that stops the configuration from loading.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// An explicitly requested settings file does not exist.
    #[error("settings file missing: {path}")]
    MissingSettings {
        /// Requested path.
        path: PathBuf,
    },
    /// The settings file could not be read.
    #[error("failed to read settings file {path}")]
    Io {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is malformed.
    #[error("failed to parse settings file {path}")]
    Parse {
        /// Settings file path.
        path: PathBuf,
        /// Parser errors.
        #[source]
        source: FileConfigParseError,
    },
    /// A setting or environment variable has an unusable value.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Setting or variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The credential store could not be loaded.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    /// The assembled configuration failed a guard rail.
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    /// The `.env` file is unreadable or malformed.
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

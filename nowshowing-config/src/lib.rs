//! Configuration for nowshowing.
//!
//! Two sources feed the runtime [`Config`]:
//!
//! - the credential store (`config.json`), written by `nowshowing-init` during
//!   the one-time Trakt OAuth setup and read at startup;
//! - optional display/poll settings from `nowshowing.toml`, overridden by
//!   environment variables (and a `.env` file when present).
//!
//! The [`oauth`] module implements the Trakt authorization-code and refresh
//! exchanges used by the setup binary.

pub mod constants;
pub mod credentials;
pub mod loader;
pub mod models;
pub mod oauth;
pub mod util;
pub mod validation;

pub use credentials::{CredentialError, CredentialStore, Credentials};
pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::{
    Config, ConfigMetadata, DeviceConfig, DeviceKind, DisplayConfig, HttpConfig,
    PollConfig, TmdbConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};

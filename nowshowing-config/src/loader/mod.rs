//! Assemble [`Config`] from the credential store, settings file and environment.

pub mod error;

use nowshowing_core::geometry::{FillMode, GeometryConfig};
use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::debug;

use self::error::ConfigLoadError;
use crate::{
    constants::{
        DEFAULT_CREDENTIALS_PATH, DEFAULT_OFFSET_PIXELS, DEFAULT_ZOOM_PERCENT,
    },
    credentials::CredentialStore,
    models::{
        Config, ConfigMetadata, DeviceConfig, DeviceKind, DisplayConfig,
        HttpConfig, PollConfig, TmdbConfig,
        sources::{EnvConfig, FileConfig},
    },
    util::parse_duration,
    validation::{self, ConfigWarnings},
};

const DEFAULT_SETTINGS_LOCATIONS: [&str; 2] =
    ["nowshowing.toml", "config/nowshowing.toml"];

/// Explicit paths that take precedence over the environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    /// Credential store; falls back to `NOWSHOWING_CONFIG`, then `config.json`.
    pub credentials_path: Option<PathBuf>,
    /// Settings file; falls back to `NOWSHOWING_SETTINGS_PATH`, then the
    /// default locations.
    pub settings_path: Option<PathBuf>,
    /// `.env` file to read instead of the one in the working directory.
    pub env_file: Option<PathBuf>,
}

/// A loaded configuration and the warnings raised while checking it.
#[derive(Debug)]
pub struct ConfigLoad {
    /// Validated configuration.
    pub config: Config,
    /// Soft issues to log at startup.
    pub warnings: ConfigWarnings,
}

/// Builder for [`ConfigLoad`].
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    /// Loader with default paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with explicit options.
    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    /// Override the credential store path.
    pub fn with_credentials_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.credentials_path = Some(path.into());
        self
    }

    /// Override the settings file path.
    pub fn with_settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.settings_path = Some(path.into());
        self
    }

    /// Read this `.env` file.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env` (if any), read the process environment and build the config.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        self.load_with_env(EnvConfig::gather(), env_file_loaded)
    }

    /// Build the config from an already gathered environment.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let credentials_path = self.credentials_path(&env);
        let credentials = CredentialStore::new(&credentials_path).load()?;

        let (file, settings_path) = self.load_file_config(&env)?;
        let file = file.unwrap_or_default();

        let config = Config {
            credentials,
            display: compose_display(&file, &env)?,
            poll: compose_poll(&file, &env)?,
            http: compose_http(&file, &env)?,
            tmdb: compose_tmdb(&file, &env),
            metadata: ConfigMetadata {
                credentials_path,
                settings_path,
                env_file_loaded,
            },
        };

        let warnings = validation::apply_guard_rails(&config)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn credentials_path(&self, env: &EnvConfig) -> PathBuf {
        self.options
            .credentials_path
            .clone()
            .or_else(|| env.credentials_path.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH))
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let requested = self
            .options
            .settings_path
            .clone()
            .or_else(|| env.settings_path.as_ref().map(PathBuf::from));

        let path = match requested {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingSettings { path });
            }
            Some(path) => path,
            None => match DEFAULT_SETTINGS_LOCATIONS
                .iter()
                .map(Path::new)
                .find(|candidate| candidate.exists())
            {
                Some(found) => found.to_path_buf(),
                None => return Ok((None, None)),
            },
        };

        debug!(path = %path.display(), "reading settings file");
        let contents =
            fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
                path: path.clone(),
                source,
            })?;
        let parsed = FileConfig::parse_from_str(&contents).map_err(|source| {
            ConfigLoadError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        Ok((Some(parsed), Some(path)))
    }
}

fn compose_display(
    file: &FileConfig,
    env: &EnvConfig,
) -> Result<DisplayConfig, ConfigLoadError> {
    let file_display = file.display.clone().unwrap_or_default();
    let file_device = file.device.clone().unwrap_or_default();

    let fill_mode = parse_env::<FillMode>("FILL_MODE", env.fill_mode.as_deref())?
        .or(file_display.fill_mode)
        .unwrap_or_default();
    let zoom_percent =
        parse_env::<f64>("ZOOM_PERCENT", env.zoom_percent.as_deref())?
            .or(file_display.zoom_percent)
            .unwrap_or(DEFAULT_ZOOM_PERCENT);
    let offset_pixels =
        parse_env::<i32>("OFFSET_PIXELS", env.offset_pixels.as_deref())?
            .or(file_display.offset_pixels)
            .unwrap_or(DEFAULT_OFFSET_PIXELS);

    let kind = parse_env::<DeviceKind>("DEVICE_KIND", env.device_kind.as_deref())?
        .or(file_device.kind)
        .unwrap_or_default();
    let defaults = DeviceConfig::for_kind(kind);
    let device = DeviceConfig {
        kind,
        width: parse_env::<u32>("DEVICE_WIDTH", env.device_width.as_deref())?
            .or(file_device.width)
            .unwrap_or(defaults.width),
        height: parse_env::<u32>("DEVICE_HEIGHT", env.device_height.as_deref())?
            .or(file_device.height)
            .unwrap_or(defaults.height),
        path: env
            .device_path
            .as_ref()
            .map(PathBuf::from)
            .or(file_device.path)
            .unwrap_or(defaults.path),
    };

    Ok(DisplayConfig {
        geometry: GeometryConfig {
            fill_mode,
            zoom_percent,
            offset_pixels,
        },
        device,
    })
}

fn compose_poll(
    file: &FileConfig,
    env: &EnvConfig,
) -> Result<PollConfig, ConfigLoadError> {
    let from_file = file.poll.as_ref().and_then(|p| p.interval.as_deref());
    let interval = duration_value("POLL_INTERVAL", env.poll_interval.as_deref())?
        .map(Ok)
        .or_else(|| from_file.map(|raw| require_duration("poll.interval", raw)))
        .transpose()?;
    Ok(interval
        .map(|interval| PollConfig { interval })
        .unwrap_or_default())
}

fn compose_http(
    file: &FileConfig,
    env: &EnvConfig,
) -> Result<HttpConfig, ConfigLoadError> {
    let from_file = file.http.as_ref().and_then(|h| h.timeout.as_deref());
    let timeout = duration_value("HTTP_TIMEOUT", env.http_timeout.as_deref())?
        .map(Ok)
        .or_else(|| from_file.map(|raw| require_duration("http.timeout", raw)))
        .transpose()?;
    Ok(timeout
        .map(|timeout| HttpConfig { timeout })
        .unwrap_or_default())
}

fn compose_tmdb(file: &FileConfig, env: &EnvConfig) -> TmdbConfig {
    env.tmdb_image_size
        .clone()
        .or_else(|| file.tmdb.as_ref().and_then(|t| t.image_size.clone()))
        .map(|image_size| TmdbConfig { image_size })
        .unwrap_or_default()
}

fn parse_env<T>(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ConfigLoadError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|err| ConfigLoadError::InvalidValue {
                key,
                value: value.to_string(),
                reason: err.to_string(),
            })
    })
    .transpose()
}

fn duration_value(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Option<Duration>, ConfigLoadError> {
    raw.map(|value| require_duration(key, value)).transpose()
}

fn require_duration(key: &'static str, raw: &str) -> Result<Duration, ConfigLoadError> {
    parse_duration(raw).ok_or_else(|| ConfigLoadError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: "expected a duration such as `5s` or `1m`".into(),
    })
}

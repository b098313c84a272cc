//! Resolved runtime configuration.

pub mod sources;

use nowshowing_core::{
    geometry::GeometryConfig,
    providers::{TmdbSettings, TraktSettings},
};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    constants::{
        DEFAULT_FRAMEBUFFER_PATH, DEFAULT_HTTP_TIMEOUT, DEFAULT_PANEL_HEIGHT,
        DEFAULT_PANEL_WIDTH, DEFAULT_PNG_PATH, DEFAULT_POLL_INTERVAL,
    },
    credentials::Credentials,
};

/// Everything the daemon needs, after merging file, env and credentials.
#[derive(Debug, Clone)]
pub struct Config {
    /// Trakt and TMDB credentials from the store.
    pub credentials: Credentials,
    /// Geometry and output device.
    pub display: DisplayConfig,
    /// Poll cadence.
    pub poll: PollConfig,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// TMDB image options.
    pub tmdb: TmdbConfig,
    /// Where the values came from.
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Settings for the Trakt watch poller.
    pub fn trakt_settings(&self) -> TraktSettings {
        TraktSettings::new(
            self.credentials.trakt_username.clone(),
            self.credentials.client_id.clone(),
        )
        .with_access_token(self.credentials.access_token.clone())
    }

    /// Settings for the TMDB poster resolver.
    pub fn tmdb_settings(&self) -> TmdbSettings {
        let mut settings = TmdbSettings::new(self.credentials.tmdb_api_key.clone());
        settings.image_size = self.tmdb.image_size.clone();
        settings
    }
}

/// How posters are fitted and where they are shown.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Fill mode, zoom and offset.
    pub geometry: GeometryConfig,
    /// Output backend.
    pub device: DeviceConfig,
}

/// Output device selection and panel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Backend to open.
    pub kind: DeviceKind,
    /// Panel width in pixels.
    pub width: u32,
    /// Panel height in pixels.
    pub height: u32,
    /// Output file or framebuffer node; unused for `dry-run`.
    pub path: PathBuf,
}

impl DeviceConfig {
    /// Default panel size and path for `kind`.
    pub fn for_kind(kind: DeviceKind) -> Self {
        Self {
            kind,
            width: DEFAULT_PANEL_WIDTH,
            height: DEFAULT_PANEL_HEIGHT,
            path: kind.default_path(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::for_kind(DeviceKind::default())
    }
}

/// Which [`PixelDevice`](nowshowing_core::device::PixelDevice) backend to open.
///
/// LED matrices are driven through a framebuffer bridge (for example
/// `rpi-fb-matrix`), so they use [`DeviceKind::Framebuffer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    /// Write each frame to a PNG file.
    #[default]
    Png,
    /// Write raw pixels to a Linux framebuffer node.
    Framebuffer,
    /// Keep frames in memory and log them.
    DryRun,
}

impl DeviceKind {
    /// Output path used when none is configured.
    pub fn default_path(self) -> PathBuf {
        match self {
            DeviceKind::Png | DeviceKind::DryRun => PathBuf::from(DEFAULT_PNG_PATH),
            DeviceKind::Framebuffer => PathBuf::from(DEFAULT_FRAMEBUFFER_PATH),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::Png => "png",
            DeviceKind::Framebuffer => "framebuffer",
            DeviceKind::DryRun => "dry-run",
        })
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "file" => Ok(DeviceKind::Png),
            "framebuffer" | "fb" => Ok(DeviceKind::Framebuffer),
            "dry-run" | "dry_run" | "dryrun" | "memory" => Ok(DeviceKind::DryRun),
            "led-matrix" | "led_matrix" | "matrix" | "hub75" | "rgb-matrix" => {
                Err(format!(
                    "`{s}` is not a separate backend; expose the LED matrix as a \
                     framebuffer (e.g. rpi-fb-matrix) and use `framebuffer`"
                ))
            }
            other => Err(format!(
                "unknown device kind `{other}` (expected png, framebuffer or dry-run)"
            )),
        }
    }
}

/// Poll cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between cycles.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Shared HTTP client settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// TMDB image options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmdbConfig {
    /// Size segment of poster URLs, e.g. `original` or `w342`.
    pub image_size: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            image_size: nowshowing_core::providers::tmdb::DEFAULT_IMAGE_SIZE
                .to_string(),
        }
    }
}

/// Where the configuration came from, for startup logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMetadata {
    /// Credential store that was read.
    pub credentials_path: PathBuf,
    /// Settings file, when one was found.
    pub settings_path: Option<PathBuf>,
    /// Whether a `.env` file was applied.
    pub env_file_loaded: bool,
}

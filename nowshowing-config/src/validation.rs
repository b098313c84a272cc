//! Guard rails applied after the configuration is assembled.

use thiserror::Error;

use crate::{
    constants::{MAX_ZOOM_PERCENT, MIN_POLL_INTERVAL},
    models::{Config, DeviceKind},
};

/// Hard configuration errors; the daemon refuses to start on any of these.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigGuardRailError {
    /// A required credential is blank.
    #[error("credential `{field}` is empty; run `nowshowing-init setup`")]
    MissingCredential {
        /// Name of the credential field.
        field: &'static str,
    },
    /// The output device has a zero width or height.
    #[error("device dimensions must be positive, got {width}x{height}")]
    InvalidDimensions {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// Zoom is negative, not finite or above the supported maximum.
    #[error(
        "zoom_percent must be a finite value between 0 and {max}, got {value}"
    )]
    InvalidZoom {
        /// Configured zoom.
        value: f64,
        /// Largest accepted zoom.
        max: f64,
    },
    /// Polling faster than the floor would hammer the Trakt API.
    #[error("poll interval must be at least {min:?}, got {actual:?}")]
    PollIntervalTooShort {
        /// Smallest accepted interval.
        min: std::time::Duration,
        /// Configured interval.
        actual: std::time::Duration,
    },
    /// Every request would time out immediately.
    #[error("HTTP timeout must be non-zero")]
    ZeroHttpTimeout,
}

/// A soft configuration issue reported at startup.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// What is off.
    pub message: String,
    /// How to fix it, when there is an obvious fix.
    pub hint: Option<String>,
}

/// Warnings collected while applying guard rails.
#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    /// Warnings in the order they were raised.
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    /// Record a warning without a hint.
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    /// Record a warning with a remediation hint.
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    /// True when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of warnings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate the warnings in order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

/// Reject unusable configuration and collect warnings for the rest.
pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let creds = &config.credentials;

    for (field, value) in [
        ("trakt_username", &creds.trakt_username),
        ("client_id", &creds.client_id),
        ("tmdb_api_key", &creds.tmdb_api_key),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigGuardRailError::MissingCredential { field });
        }
    }

    let device = &config.display.device;
    if device.width == 0 || device.height == 0 {
        return Err(ConfigGuardRailError::InvalidDimensions {
            width: device.width,
            height: device.height,
        });
    }

    let zoom = config.display.geometry.zoom_percent;
    if !zoom.is_finite() || !(0.0..=MAX_ZOOM_PERCENT).contains(&zoom) {
        return Err(ConfigGuardRailError::InvalidZoom {
            value: zoom,
            max: MAX_ZOOM_PERCENT,
        });
    }

    if config.poll.interval < MIN_POLL_INTERVAL {
        return Err(ConfigGuardRailError::PollIntervalTooShort {
            min: MIN_POLL_INTERVAL,
            actual: config.poll.interval,
        });
    }

    if config.http.timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroHttpTimeout);
    }

    if !creds.has_tokens() {
        warnings.push_with_hint(
            "no Trakt access token stored; only public profiles can be polled",
            "Run `nowshowing-init setup` to authorize the application",
        );
    }

    if device.kind == DeviceKind::DryRun {
        warnings.push("device kind is dry-run; frames are logged but not shown");
    }

    Ok(warnings)
}

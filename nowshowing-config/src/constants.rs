//! Defaults and fixed endpoints.

use std::time::Duration;

/// Credential store written by `nowshowing-init`.
pub const DEFAULT_CREDENTIALS_PATH: &str = "config.json";
/// Output file for the `png` device.
pub const DEFAULT_PNG_PATH: &str = "nowshowing.png";
/// Framebuffer node for the `framebuffer` device.
pub const DEFAULT_FRAMEBUFFER_PATH: &str = "/dev/fb0";

/// A single 64x64 HUB75 panel.
pub const DEFAULT_PANEL_WIDTH: u32 = 64;
/// See [`DEFAULT_PANEL_WIDTH`].
pub const DEFAULT_PANEL_HEIGHT: u32 = 64;

/// Slight zoom and upward bias keep title text on typical posters in view.
pub const DEFAULT_ZOOM_PERCENT: f64 = 8.0;
/// See [`DEFAULT_ZOOM_PERCENT`].
pub const DEFAULT_OFFSET_PIXELS: i32 = -10;
/// Upper bound for `zoom_percent` (11x).
pub const MAX_ZOOM_PERCENT: f64 = 1000.0;

/// Delay between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Floor for the poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Per-request timeout for Trakt, TMDB and poster downloads.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser URL that starts the Trakt authorization flow.
pub const TRAKT_AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";
/// Token endpoint for code exchange and refresh.
pub const TRAKT_TOKEN_URL: &str = "https://api.trakt.tv/oauth/token";
/// Out-of-band redirect; Trakt shows the code instead of redirecting.
pub const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

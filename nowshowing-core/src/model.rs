//! Values that flow through one pipeline cycle.

use image::RgbImage;
use std::fmt;

/// Normalized description of what the tracked user is consuming right now.
///
/// Built fresh on every poll and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchState {
    /// Nothing is playing, or the tracker could not be asked.
    #[default]
    Nothing,
    /// A movie is playing.
    WatchingMovie {
        /// TMDB movie id.
        tmdb_id: u64,
    },
    /// An episode of a show is playing.
    WatchingEpisode {
        /// TMDB id of the show, not the episode.
        show_tmdb_id: u64,
        /// Season the episode belongs to.
        season_number: u32,
    },
}

impl WatchState {
    /// True for [`WatchState::Nothing`].
    pub fn is_nothing(&self) -> bool {
        matches!(self, WatchState::Nothing)
    }
}

/// Absolute URL of a poster image on the provider's CDN.
///
/// Equality is plain string equality on the URL; the display controller relies
/// on it to suppress redundant redraws.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PosterReference(String);

impl PosterReference {
    /// Wrap an absolute poster URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PosterReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PosterReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PosterReference {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// An RGB frame sized exactly to the output device.
#[derive(Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pixels: RgbImage,
}

impl DisplayFrame {
    /// Wrap a rendered image.
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// The underlying image.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Tightly packed RGB888 rows.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Unwrap the image.
    pub fn into_inner(self) -> RgbImage {
        self.pixels
    }
}

impl fmt::Debug for DisplayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayFrame")
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .finish()
    }
}

//! Owner of the output device and the last-shown poster.

use std::{fmt, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    device::PixelDevice,
    error::{DisplayError, Result},
    geometry::{self, GeometryConfig},
    http::ImageFetcher,
    model::{DisplayFrame, PosterReference},
};

/// What a call to [`DisplayController::show`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// No reference was given.
    Skipped,
    /// The reference is already on the panel.
    Unchanged,
    /// A new frame was uploaded.
    Displayed,
}

struct DisplayState<D> {
    device: D,
    last_shown: Option<PosterReference>,
}

struct Shared<D> {
    fetcher: Arc<dyn ImageFetcher>,
    geometry: GeometryConfig,
    dimensions: (u32, u32),
    state: Arc<Mutex<DisplayState<D>>>,
}

/// Serializes device writes and suppresses redundant redraws.
///
/// The device and the last-shown reference live behind one mutex that is
/// only taken for the compare + clear + upload sequence. Downloading,
/// decoding and resampling all happen before the lock is acquired, so a slow
/// CDN never blocks another caller's upload. Device writes run on the
/// blocking pool with the lock guard moved along.
///
/// Clones share the same device and cache.
pub struct DisplayController<D> {
    inner: Arc<Shared<D>>,
}

impl<D> Clone for DisplayController<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> fmt::Debug for DisplayController<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayController")
            .field("geometry", &self.inner.geometry)
            .field("dimensions", &self.inner.dimensions)
            .finish_non_exhaustive()
    }
}

impl<D: PixelDevice> DisplayController<D> {
    /// Take ownership of `device`; nothing is shown until [`show`](Self::show).
    pub fn new(
        device: D,
        fetcher: Arc<dyn ImageFetcher>,
        geometry: GeometryConfig,
    ) -> Self {
        let dimensions = device.dimensions();
        Self {
            inner: Arc::new(Shared {
                fetcher,
                geometry,
                dimensions,
                state: Arc::new(Mutex::new(DisplayState {
                    device,
                    last_shown: None,
                })),
            }),
        }
    }

    /// Panel size, read once from the device.
    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions
    }

    /// Geometry applied to every poster.
    pub fn geometry(&self) -> &GeometryConfig {
        &self.inner.geometry
    }

    /// Reference currently on the panel, if any.
    pub async fn last_shown(&self) -> Option<PosterReference> {
        self.inner.state.lock().await.last_shown.clone()
    }

    /// Put `reference` on the panel unless it is already there.
    ///
    /// Any failure leaves the last-shown reference untouched so the next
    /// cycle retries the same poster.
    pub async fn show(
        &self,
        reference: Option<&PosterReference>,
    ) -> Result<ShowOutcome> {
        let Some(reference) = reference else {
            return Ok(ShowOutcome::Skipped);
        };

        if self.last_shown().await.as_ref() == Some(reference) {
            debug!(poster = %reference, "poster already displayed");
            return Ok(ShowOutcome::Unchanged);
        }

        let bytes = self.inner.fetcher.fetch(reference).await?;
        let frame = self.render(bytes).await?;

        let mut state = Arc::clone(&self.inner.state).lock_owned().await;
        // Another caller may have uploaded the same poster while we were
        // downloading.
        if state.last_shown.as_ref() == Some(reference) {
            return Ok(ShowOutcome::Unchanged);
        }

        let shown = reference.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            state.device.clear()?;
            debug!("canvas cleared");
            state.device.upload(&frame)?;
            state.last_shown = Some(shown);
            Ok(())
        })
        .await
        .map_err(|err| DisplayError::Worker(err.to_string()))??;

        info!(poster = %reference, "poster displayed");
        Ok(ShowOutcome::Displayed)
    }

    async fn render(&self, bytes: Vec<u8>) -> Result<DisplayFrame> {
        let target = self.inner.dimensions;
        let geometry = self.inner.geometry;

        tokio::task::spawn_blocking(move || -> Result<DisplayFrame> {
            let source = image::load_from_memory(&bytes)?;
            Ok(geometry::transform(&source, target, &geometry)?)
        })
        .await
        .map_err(|err| DisplayError::Worker(err.to_string()))?
    }
}

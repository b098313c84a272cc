//! The poll → resolve → display loop.

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    device::PixelDevice,
    display::{DisplayController, ShowOutcome},
    model::{PosterReference, WatchState},
};

/// Something that reports what the user is watching. Must not fail.
#[async_trait]
pub trait WatchSource: Send + Sync {
    /// Current watch state; problems read as [`WatchState::Nothing`].
    async fn poll(&self) -> WatchState;
}

/// Something that maps a watch state to poster artwork. Must not fail.
#[async_trait]
pub trait PosterSource: Send + Sync {
    /// Poster for `state`, `None` when there is no artwork.
    async fn resolve(&self, state: &WatchState) -> Option<PosterReference>;
}

#[async_trait]
impl<T: WatchSource + ?Sized> WatchSource for Arc<T> {
    async fn poll(&self) -> WatchState {
        (**self).poll().await
    }
}

#[async_trait]
impl<T: PosterSource + ?Sized> PosterSource for Arc<T> {
    async fn resolve(&self, state: &WatchState) -> Option<PosterReference> {
        (**self).resolve(state).await
    }
}

/// Result of a single [`PipelineDriver::run_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The tracker reported nothing; the panel was left alone.
    NothingPlaying,
    /// Something is playing but no poster was found.
    NoArtwork(WatchState),
    /// The poster is already on the panel.
    Unchanged(PosterReference),
    /// A new poster was uploaded.
    Displayed(PosterReference),
    /// Downloading, rendering or uploading the poster failed.
    DisplayFailed(PosterReference),
}

/// Drives the watch source, poster source and display on a fixed interval.
pub struct PipelineDriver<W, P, D> {
    watch: W,
    posters: P,
    display: DisplayController<D>,
    interval: Duration,
}

impl<W, P, D> std::fmt::Debug for PipelineDriver<W, P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineDriver")
            .field("display", &self.display)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl<W, P, D> PipelineDriver<W, P, D>
where
    W: WatchSource,
    P: PosterSource,
    D: PixelDevice,
{
    /// Driver polling every `interval`.
    pub fn new(
        watch: W,
        posters: P,
        display: DisplayController<D>,
        interval: Duration,
    ) -> Self {
        Self {
            watch,
            posters,
            display,
            interval,
        }
    }

    /// The display controller.
    pub fn display(&self) -> &DisplayController<D> {
        &self.display
    }

    /// Delay between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one poll → resolve → display pass. Errors are logged and folded
    /// into the returned outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let state = self.watch.poll().await;
        if state.is_nothing() {
            debug!("nothing playing");
            return CycleOutcome::NothingPlaying;
        }

        let Some(reference) = self.posters.resolve(&state).await else {
            debug!(?state, "no artwork for current item");
            return CycleOutcome::NoArtwork(state);
        };

        match self.display.show(Some(&reference)).await {
            Ok(ShowOutcome::Displayed) => CycleOutcome::Displayed(reference),
            Ok(ShowOutcome::Unchanged | ShowOutcome::Skipped) => {
                CycleOutcome::Unchanged(reference)
            }
            Err(err) => {
                warn!(
                    poster = %reference,
                    error = %err,
                    "display attempt failed; will retry next cycle"
                );
                CycleOutcome::DisplayFailed(reference)
            }
        }
    }

    /// Loop forever, sleeping `interval` after every cycle.
    pub async fn run(&self) {
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            self.run_cycle()
                .instrument(info_span!("cycle", n = cycle))
                .await;
            tokio::time::sleep(self.interval).await;
        }
    }
}

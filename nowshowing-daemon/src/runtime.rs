//! Wiring from a loaded [`Config`] to a running pipeline.

use std::sync::Arc;

use anyhow::{Context, Result};
use nowshowing_config::{Config, DeviceConfig, DeviceKind};
use nowshowing_core::{
    DisplayController, PipelineDriver,
    device::{FramebufferDevice, MemoryDevice, PixelDevice, PngFileDevice},
    http::{HttpImageFetcher, build_client},
    providers::{TmdbPosterResolver, TraktWatchPoller},
};
use tracing::info;

pub type BoxedDevice = Box<dyn PixelDevice>;

pub type Driver = PipelineDriver<TraktWatchPoller, TmdbPosterResolver, BoxedDevice>;

/// Open the configured output. A device that cannot be opened is fatal.
pub fn open_device(config: &DeviceConfig) -> Result<BoxedDevice> {
    let device: BoxedDevice = match config.kind {
        DeviceKind::Png => Box::new(PngFileDevice::new(
            &config.path,
            config.width,
            config.height,
        )),
        DeviceKind::Framebuffer => Box::new(
            FramebufferDevice::open(&config.path, config.width, config.height)
                .with_context(|| {
                    format!(
                        "failed to open framebuffer {}",
                        config.path.display()
                    )
                })?,
        ),
        DeviceKind::DryRun => {
            Box::new(MemoryDevice::new(config.width, config.height))
        }
    };
    info!(
        kind = %config.kind,
        path = %config.path.display(),
        width = config.width,
        height = config.height,
        "output device ready"
    );
    Ok(device)
}

pub fn build_driver(config: &Config) -> Result<Driver> {
    let http = build_client(config.http.timeout)
        .context("failed to build HTTP client")?;

    let device = open_device(&config.display.device)?;
    let display = DisplayController::new(
        device,
        Arc::new(HttpImageFetcher::new(http.clone())),
        config.display.geometry,
    );

    Ok(PipelineDriver::new(
        TraktWatchPoller::new(http.clone(), config.trakt_settings()),
        TmdbPosterResolver::new(http, config.tmdb_settings()),
        display,
        config.poll.interval,
    ))
}

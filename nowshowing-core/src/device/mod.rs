//! Output devices that accept finished frames.

mod framebuffer;
mod memory;
mod png_sink;

pub use framebuffer::{FramebufferDevice, FramebufferLayout};
pub use memory::{MemoryDevice, MemoryDeviceLog};
pub use png_sink::PngFileDevice;

use std::path::PathBuf;
use thiserror::Error;

use crate::model::DisplayFrame;

/// Failures opening or writing an output device.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Reading or writing the device file failed.
    #[error("device I/O failed for {path}: {source}")]
    Io {
        /// Device file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The frame was not sized to the panel.
    #[error(
        "frame is {frame_width}x{frame_height} but device is {device_width}x{device_height}"
    )]
    SizeMismatch {
        /// Frame width.
        frame_width: u32,
        /// Frame height.
        frame_height: u32,
        /// Panel width.
        device_width: u32,
        /// Panel height.
        device_height: u32,
    },

    /// Encoding the frame for the device failed.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),

    /// The device cannot take the frame, or was configured in a way it
    /// cannot support.
    #[error("device rejected the write: {0}")]
    Rejected(String),
}

/// A fixed-resolution panel driven by clear-then-upload writes.
///
/// Implementations need not be thread safe; the display controller holds the
/// device behind a mutex for the whole clear + upload sequence.
pub trait PixelDevice: Send + 'static {
    /// Panel size as `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Blank the panel.
    fn clear(&mut self) -> Result<(), DeviceError>;

    /// Push a frame sized exactly to [`PixelDevice::dimensions`].
    fn upload(&mut self, frame: &DisplayFrame) -> Result<(), DeviceError>;
}

impl<D: PixelDevice + ?Sized> PixelDevice for Box<D> {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn clear(&mut self) -> Result<(), DeviceError> {
        (**self).clear()
    }

    fn upload(&mut self, frame: &DisplayFrame) -> Result<(), DeviceError> {
        (**self).upload(frame)
    }
}

pub(crate) fn ensure_frame_fits(
    device: (u32, u32),
    frame: &DisplayFrame,
) -> Result<(), DeviceError> {
    let (frame_width, frame_height) = frame.dimensions();
    if (frame_width, frame_height) != device {
        return Err(DeviceError::SizeMismatch {
            frame_width,
            frame_height,
            device_width: device.0,
            device_height: device.1,
        });
    }
    Ok(())
}

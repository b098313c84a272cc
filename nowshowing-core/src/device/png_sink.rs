use image::{ImageFormat, RgbImage};
use std::{
    io::{Cursor, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{DeviceError, PixelDevice, ensure_frame_fits};
use crate::model::DisplayFrame;

/// Writes every frame to a PNG file, replacing it atomically.
///
/// Useful as a preview target or for panels driven by an external process
/// that watches the file.
#[derive(Debug)]
pub struct PngFileDevice {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl PngFileDevice {
    /// Device writing `width`x`height` frames to `path`.
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }

    /// Output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_png(&self, pixels: &RgbImage) -> Result<(), DeviceError> {
        let mut encoded = Cursor::new(Vec::new());
        pixels.write_to(&mut encoded, ImageFormat::Png)?;

        let io_err = |source: std::io::Error| DeviceError::Io {
            path: self.path.clone(),
            source,
        };

        // Write to a sibling temp file, fsync, then rename over the target.
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(encoded.get_ref()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;

        debug!(path = %self.path.display(), "frame written");
        Ok(())
    }
}

impl PixelDevice for PngFileDevice {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) -> Result<(), DeviceError> {
        self.write_png(&RgbImage::new(self.width, self.height))
    }

    fn upload(&mut self, frame: &DisplayFrame) -> Result<(), DeviceError> {
        ensure_frame_fits(self.dimensions(), frame)?;
        self.write_png(frame.pixels())
    }
}

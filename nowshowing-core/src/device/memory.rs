use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use super::{DeviceError, PixelDevice, ensure_frame_fits};
use crate::model::DisplayFrame;

/// What a [`MemoryDevice`] has been asked to do so far.
#[derive(Debug, Default)]
pub struct MemoryDeviceLog {
    /// Number of clears.
    pub clears: usize,
    /// Number of accepted uploads.
    pub uploads: usize,
    /// Most recently accepted frame.
    pub last_frame: Option<DisplayFrame>,
    /// Number of upcoming uploads to reject.
    pub fail_uploads: usize,
}

/// Keeps frames in memory. Backs the `dry-run` device kind and tests.
///
/// Clones share the same log, so a handle kept outside the display
/// controller can observe writes.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    width: u32,
    height: u32,
    log: Arc<Mutex<MemoryDeviceLog>>,
}

impl MemoryDevice {
    /// Empty device of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            log: Arc::new(Mutex::new(MemoryDeviceLog::default())),
        }
    }

    /// Lock the shared log.
    pub fn log(&self) -> MutexGuard<'_, MemoryDeviceLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Accepted uploads so far.
    pub fn upload_count(&self) -> usize {
        self.log().uploads
    }

    /// Reject the next `count` uploads with [`DeviceError::Rejected`].
    pub fn fail_next_uploads(&self, count: usize) {
        self.log().fail_uploads = count;
    }
}

impl PixelDevice for MemoryDevice {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) -> Result<(), DeviceError> {
        let mut log = self.log();
        log.clears += 1;
        log.last_frame = None;
        Ok(())
    }

    fn upload(&mut self, frame: &DisplayFrame) -> Result<(), DeviceError> {
        ensure_frame_fits(self.dimensions(), frame)?;

        let mut log = self.log();
        if log.fail_uploads > 0 {
            log.fail_uploads -= 1;
            return Err(DeviceError::Rejected("simulated upload failure".into()));
        }
        log.uploads += 1;
        log.last_frame = Some(frame.clone());
        info!(uploads = log.uploads, "frame accepted by in-memory device");
        Ok(())
    }
}

use std::{
    fs::{File, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

use super::{DeviceError, PixelDevice, ensure_frame_fits};
use crate::model::DisplayFrame;

const SYSFS_GRAPHICS: &str = "/sys/class/graphics";

/// Memory layout of a framebuffer as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferLayout {
    /// 16 (RGB565) or 32 (XRGB8888).
    pub bits_per_pixel: u32,
    /// Bytes per line, including any padding.
    pub stride: u32,
    /// Visible width in pixels.
    pub virtual_width: u32,
    /// Visible height in pixels.
    pub virtual_height: u32,
}

impl FramebufferLayout {
    /// Read `bits_per_pixel`, `stride` and `virtual_size` from a sysfs
    /// directory such as `/sys/class/graphics/fb0`.
    pub fn read_from(sysfs_dir: &Path) -> Result<Self, DeviceError> {
        let read = |name: &str| -> Result<String, DeviceError> {
            let path = sysfs_dir.join(name);
            std::fs::read_to_string(&path)
                .map(|raw| raw.trim().to_string())
                .map_err(|source| DeviceError::Io { path, source })
        };
        let number = |name: &str, raw: &str| -> Result<u32, DeviceError> {
            raw.trim().parse().map_err(|_| {
                DeviceError::Rejected(format!("unreadable {name} `{raw}`"))
            })
        };

        let bits_per_pixel = number("bits_per_pixel", &read("bits_per_pixel")?)?;
        let stride = number("stride", &read("stride")?)?;
        let virtual_size = read("virtual_size")?;
        let (w, h) = virtual_size.split_once(',').ok_or_else(|| {
            DeviceError::Rejected(format!("unreadable virtual_size `{virtual_size}`"))
        })?;

        Ok(Self {
            bits_per_pixel,
            stride,
            virtual_width: number("virtual_size", w)?,
            virtual_height: number("virtual_size", h)?,
        })
    }

    fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel as usize / 8
    }

    fn check_panel(&self, width: u32, height: u32) -> Result<(), DeviceError> {
        if !matches!(self.bits_per_pixel, 16 | 32) {
            return Err(DeviceError::Rejected(format!(
                "unsupported framebuffer depth {} bpp (expected 16 or 32)",
                self.bits_per_pixel
            )));
        }
        if width > self.virtual_width || height > self.virtual_height {
            return Err(DeviceError::Rejected(format!(
                "panel {width}x{height} does not fit framebuffer {}x{}",
                self.virtual_width, self.virtual_height
            )));
        }
        if (self.stride as usize) < width as usize * self.bytes_per_pixel() {
            return Err(DeviceError::Rejected(format!(
                "stride {} is shorter than a {width} pixel row",
                self.stride
            )));
        }
        Ok(())
    }
}

/// Linux framebuffer node, 16-bit RGB565 or 32-bit XRGB8888, little endian.
///
/// The panel occupies the top-left `width`x`height` corner; each row is
/// written at its stride offset.
#[derive(Debug)]
pub struct FramebufferDevice {
    path: PathBuf,
    file: File,
    width: u32,
    height: u32,
    layout: FramebufferLayout,
}

impl FramebufferDevice {
    /// Open the framebuffer node for writing and read its layout from
    /// `/sys/class/graphics/<node>`. Failing here is a startup error.
    pub fn open(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
    ) -> Result<Self, DeviceError> {
        let path = path.into();
        let file = open_node(&path)?;
        let node = path.file_name().ok_or_else(|| {
            DeviceError::Rejected(format!("{} is not a device node", path.display()))
        })?;
        let layout = FramebufferLayout::read_from(&Path::new(SYSFS_GRAPHICS).join(node))?;
        Self::with_file(path, file, width, height, layout)
    }

    /// Open with a known layout instead of asking sysfs.
    pub fn open_with_layout(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        layout: FramebufferLayout,
    ) -> Result<Self, DeviceError> {
        let path = path.into();
        let file = open_node(&path)?;
        Self::with_file(path, file, width, height, layout)
    }

    fn with_file(
        path: PathBuf,
        file: File,
        width: u32,
        height: u32,
        layout: FramebufferLayout,
    ) -> Result<Self, DeviceError> {
        layout.check_panel(width, height)?;
        debug!(
            path = %path.display(),
            bpp = layout.bits_per_pixel,
            stride = layout.stride,
            "framebuffer opened"
        );
        Ok(Self {
            path,
            file,
            width,
            height,
            layout,
        })
    }

    /// The framebuffer node.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Layout the device writes with.
    pub fn layout(&self) -> FramebufferLayout {
        self.layout
    }

    /// Write packed rows, each `width * bytes_per_pixel` long, at stride offsets.
    fn write_rows(&mut self, packed: &[u8]) -> Result<(), DeviceError> {
        let io_err = |source: std::io::Error| DeviceError::Io {
            path: self.path.clone(),
            source,
        };
        let row_len = self.width as usize * self.layout.bytes_per_pixel();
        for (y, row) in packed.chunks_exact(row_len).enumerate() {
            let offset = y as u64 * u64::from(self.layout.stride);
            self.file.seek(SeekFrom::Start(offset)).map_err(io_err)?;
            self.file.write_all(row).map_err(io_err)?;
        }
        self.file.flush().map_err(io_err)?;
        Ok(())
    }

    fn pack(&self, rgb: &[u8]) -> Vec<u8> {
        match self.layout.bits_per_pixel {
            16 => rgb888_to_rgb565(rgb),
            _ => rgb888_to_xrgb8888(rgb),
        }
    }
}

fn open_node(path: &Path) -> Result<File, DeviceError> {
    OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|source| DeviceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Pack RGB888 pixels into little-endian RGB565.
pub(crate) fn rgb888_to_rgb565(rgb: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(rgb.len() / 3 * 2);
    for chunk in rgb.chunks_exact(3) {
        let (r, g, b) = (chunk[0], chunk[1], chunk[2]);
        let mut rgb565: u16 = (r as u16 & 0b1111_1000) << 8;
        rgb565 |= (g as u16 & 0b1111_1100) << 3;
        rgb565 |= (b as u16) >> 3;
        raw.extend(rgb565.to_le_bytes());
    }
    raw
}

/// Pack RGB888 pixels into little-endian XRGB8888 (bytes B, G, R, X).
pub(crate) fn rgb888_to_xrgb8888(rgb: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(rgb.len() / 3 * 4);
    for chunk in rgb.chunks_exact(3) {
        raw.extend([chunk[2], chunk[1], chunk[0], 0xFF]);
    }
    raw
}

impl PixelDevice for FramebufferDevice {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) -> Result<(), DeviceError> {
        let len = self.width as usize
            * self.height as usize
            * self.layout.bytes_per_pixel();
        self.write_rows(&vec![0; len])
    }

    fn upload(&mut self, frame: &DisplayFrame) -> Result<(), DeviceError> {
        ensure_frame_fits(self.dimensions(), frame)?;
        let raw = self.pack(frame.as_raw());
        self.write_rows(&raw)?;
        debug!(path = %self.path.display(), bytes = raw.len(), "framebuffer updated");
        Ok(())
    }
}

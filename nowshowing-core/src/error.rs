//! Errors raised while showing a poster.

use thiserror::Error;

use crate::device::DeviceError;

/// Invalid inputs to the geometry transform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// The decoded poster has no pixels.
    #[error("source image has zero area ({width}x{height})")]
    EmptySource {
        /// Source width.
        width: u32,
        /// Source height.
        height: u32,
    },

    /// The panel has no pixels.
    #[error("target canvas has zero area ({width}x{height})")]
    EmptyTarget {
        /// Target width.
        width: u32,
        /// Target height.
        height: u32,
    },
}

/// Failure of a single display attempt.
///
/// None of these are fatal: the controller keeps its last-shown reference so
/// the same poster is retried on the next cycle.
#[derive(Error, Debug)]
pub enum DisplayError {
    /// The poster could not be downloaded.
    #[error("poster download failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The CDN answered with a non-success status.
    #[error("poster download returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The downloaded bytes are not a supported image.
    #[error("poster could not be decoded: {0}")]
    Decode(#[from] image::ImageError),

    /// The geometry transform refused the input.
    #[error("poster geometry rejected: {0}")]
    Geometry(#[from] GeometryError),

    /// Clearing or uploading to the device failed.
    #[error("device write failed: {0}")]
    Device(#[from] DeviceError),

    /// A blocking worker panicked or was cancelled.
    #[error("frame worker failed: {0}")]
    Worker(String),
}

/// Result of a display attempt.
pub type Result<T> = std::result::Result<T, DisplayError>;

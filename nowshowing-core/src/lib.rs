//! Core pipeline for nowshowing.
//!
//! Polls Trakt for what a user is currently watching, resolves the matching
//! TMDB poster, fits it to the output panel and hands the frame to a
//! [`device::PixelDevice`]. The display is only rewritten when the poster
//! actually changes.
//!
//! Leaf-first:
//! - [`geometry`]: fill/fit/zoom/offset transform onto an exact-size canvas
//! - [`providers::tmdb`]: poster resolution
//! - [`providers::trakt`]: "currently watching" polling
//! - [`display`]: last-shown cache and serialized device writes
//! - [`pipeline`]: the poll → resolve → display loop

pub mod device;
pub mod display;
pub mod error;
pub mod geometry;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod providers;

#[cfg(test)]
mod test_support;

pub use display::{DisplayController, ShowOutcome};
pub use error::{DisplayError, GeometryError};
pub use geometry::{FillMode, GeometryConfig};
pub use model::{DisplayFrame, PosterReference, WatchState};
pub use pipeline::{CycleOutcome, PipelineDriver, PosterSource, WatchSource};

//! Metadata providers: Trakt for watch state, TMDB for posters.

pub mod tmdb;
pub mod trakt;

pub use tmdb::{ProviderError, TmdbPosterResolver, TmdbSettings};
pub use trakt::{TrackerError, TraktSettings, TraktWatchPoller, WatchingResponse};

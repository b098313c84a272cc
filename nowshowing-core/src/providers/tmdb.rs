//! TMDB poster resolution.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, warn};

use crate::{
    model::{PosterReference, WatchState},
    pipeline::PosterSource,
};

/// TMDB request failures.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Any other non-success status, with TMDB's message when it sent one.
    #[error("API error: {0}")]
    ApiError(String),

    /// HTTP 404.
    #[error("Not found")]
    NotFound,

    /// HTTP 429.
    #[error("Rate limited")]
    RateLimited,

    /// HTTP 401.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// TMDB could not be reached or the body could not be decoded.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// v3 API root.
pub const TMDB_V3_BASE: &str = "https://api.themoviedb.org/3";
/// Image CDN root.
pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
/// Full-resolution posters.
pub const DEFAULT_IMAGE_SIZE: &str = "original";

/// API key and endpoints.
#[derive(Clone)]
pub struct TmdbSettings {
    /// v3 API key, sent as the `api_key` query parameter.
    pub api_key: String,
    /// API root, [`TMDB_V3_BASE`] unless overridden.
    pub api_base: String,
    /// CDN root, [`TMDB_IMAGE_BASE`] unless overridden.
    pub image_base: String,
    /// CDN size bucket such as `original` or `w500`.
    pub image_size: String,
}

impl TmdbSettings {
    /// Production endpoints with full-size posters.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: TMDB_V3_BASE.to_string(),
            image_base: TMDB_IMAGE_BASE.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }
}

impl fmt::Debug for TmdbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbSettings")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("image_base", &self.image_base)
            .field("image_size", &self.image_size)
            .finish()
    }
}

/// Movie and season detail payloads share the one field we need.
#[derive(Debug, Deserialize)]
struct PosterDetails {
    #[serde(default)]
    poster_path: Option<String>,
}

/// Resolves poster URLs from TMDB movie and season details.
#[derive(Debug, Clone)]
pub struct TmdbPosterResolver {
    http: reqwest::Client,
    settings: TmdbSettings,
}

impl TmdbPosterResolver {
    /// Resolver sharing `http` with the rest of the pipeline.
    pub fn new(http: reqwest::Client, settings: TmdbSettings) -> Self {
        Self { http, settings }
    }

    /// Current settings.
    pub fn settings(&self) -> &TmdbSettings {
        &self.settings
    }

    async fn get_tmdb_json<T>(&self, path: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.settings.api_base.trim_end_matches('/'), path);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.settings.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(ProviderError::from);
        }

        #[derive(Debug, Deserialize)]
        struct TmdbErrorBody {
            #[serde(default)]
            status_message: Option<String>,
        }

        let message = response
            .json::<TmdbErrorBody>()
            .await
            .ok()
            .and_then(|body| body.status_message)
            .unwrap_or_else(|| {
                format!("TMDB request failed with status {}", status)
            });

        match status.as_u16() {
            401 => Err(ProviderError::InvalidApiKey),
            404 => Err(ProviderError::NotFound),
            429 => Err(ProviderError::RateLimited),
            _ => Err(ProviderError::ApiError(message)),
        }
    }

    /// Join a TMDB `poster_path` onto the image CDN.
    pub fn poster_url(&self, poster_path: &str) -> PosterReference {
        let base = self.settings.image_base.trim_end_matches('/');
        let size = self.settings.image_size.trim_matches('/');
        let path = poster_path.trim_start_matches('/');
        PosterReference::new(format!("{base}/{size}/{path}"))
    }

    fn reference_from(&self, details: PosterDetails) -> Option<PosterReference> {
        details
            .poster_path
            .filter(|path| !path.trim().is_empty())
            .map(|path| self.poster_url(&path))
    }

    /// Poster of a movie, `None` when TMDB has no artwork for it.
    pub async fn movie_poster(
        &self,
        tmdb_id: u64,
    ) -> Result<Option<PosterReference>, ProviderError> {
        let details: PosterDetails =
            self.get_tmdb_json(&format!("/movie/{tmdb_id}")).await?;
        Ok(self.reference_from(details))
    }

    /// Poster of one season of a show.
    pub async fn season_poster(
        &self,
        show_tmdb_id: u64,
        season_number: u32,
    ) -> Result<Option<PosterReference>, ProviderError> {
        let details: PosterDetails = self
            .get_tmdb_json(&format!("/tv/{show_tmdb_id}/season/{season_number}"))
            .await?;
        Ok(self.reference_from(details))
    }

    /// Resolve the poster for a watch state. Provider failures are logged and
    /// read as "no artwork" for this cycle.
    pub async fn resolve(&self, state: &WatchState) -> Option<PosterReference> {
        let result = match *state {
            WatchState::Nothing => return None,
            WatchState::WatchingMovie { tmdb_id } => {
                self.movie_poster(tmdb_id).await
            }
            WatchState::WatchingEpisode {
                show_tmdb_id,
                season_number,
            } => self.season_poster(show_tmdb_id, season_number).await,
        };

        match result {
            Ok(Some(reference)) => {
                debug!(?state, poster = %reference, "poster resolved");
                Some(reference)
            }
            Ok(None) => {
                debug!(?state, "TMDB entry has no poster");
                None
            }
            Err(ProviderError::NotFound) => {
                debug!(?state, "TMDB has no entry for watch state");
                None
            }
            Err(err) => {
                warn!(?state, error = %err, "poster lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl PosterSource for TmdbPosterResolver {
    async fn resolve(&self, state: &WatchState) -> Option<PosterReference> {
        TmdbPosterResolver::resolve(self, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json, serve};

    fn resolver(settings: TmdbSettings) -> TmdbPosterResolver {
        TmdbPosterResolver::new(reqwest::Client::new(), settings)
    }

    #[test]
    fn poster_url_joins_cdn_size_and_path() {
        let tmdb = resolver(TmdbSettings::new("key"));
        assert_eq!(
            tmdb.poster_url("/abc123.jpg").as_str(),
            "https://image.tmdb.org/t/p/original/abc123.jpg"
        );

        let mut settings = TmdbSettings::new("key");
        settings.image_size = "w342".into();
        settings.image_base = "https://cdn.example/t/p/".into();
        assert_eq!(
            resolver(settings).poster_url("/x.png").as_str(),
            "https://cdn.example/t/p/w342/x.png"
        );
    }

    #[test]
    fn missing_or_blank_poster_path_is_no_artwork() {
        let tmdb = resolver(TmdbSettings::new("key"));

        let details: PosterDetails =
            serde_json::from_str(r#"{"id": 1, "poster_path": null}"#).unwrap();
        assert_eq!(tmdb.reference_from(details), None);

        let details: PosterDetails =
            serde_json::from_str(r#"{"id": 1, "title": "Heat"}"#).unwrap();
        assert_eq!(tmdb.reference_from(details), None);

        let details: PosterDetails =
            serde_json::from_str(r#"{"poster_path": ""}"#).unwrap();
        assert_eq!(tmdb.reference_from(details), None);
    }

    #[test]
    fn season_payload_yields_a_reference() {
        let tmdb = resolver(TmdbSettings::new("key"));
        let details: PosterDetails = serde_json::from_str(
            r#"{"_id": "x", "season_number": 2, "poster_path": "/s2.jpg", "episodes": []}"#,
        )
        .unwrap();
        assert_eq!(
            tmdb.reference_from(details),
            Some(PosterReference::new(
                "https://image.tmdb.org/t/p/original/s2.jpg"
            ))
        );
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let rendered = format!("{:?}", TmdbSettings::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }

    #[tokio::test]
    async fn nothing_never_hits_the_network() {
        let mut settings = TmdbSettings::new("key");
        settings.api_base = "http://127.0.0.1:9".into();
        assert_eq!(resolver(settings).resolve(&WatchState::Nothing).await, None);
    }

    #[tokio::test]
    async fn transport_failures_resolve_to_none() {
        let mut settings = TmdbSettings::new("key");
        settings.api_base = "http://127.0.0.1:9".into();
        let tmdb = resolver(settings);

        assert!(tmdb.movie_poster(603).await.is_err());
        assert_eq!(
            tmdb.resolve(&WatchState::WatchingMovie { tmdb_id: 603 }).await,
            None
        );
        assert_eq!(
            tmdb.resolve(&WatchState::WatchingEpisode {
                show_tmdb_id: 1396,
                season_number: 1,
            })
            .await,
            None
        );
    }

    fn resolver_at(base_url: String) -> TmdbPosterResolver {
        let mut settings = TmdbSettings::new("k3y");
        settings.api_base = base_url;
        resolver(settings)
    }

    #[tokio::test]
    async fn movie_details_resolve_to_a_cdn_url() {
        let (base_url, server) =
            serve(vec![json("200 OK", r#"{"id": 603, "poster_path": "/p.jpg"}"#)])
                .await;

        assert_eq!(
            resolver_at(base_url)
                .resolve(&WatchState::WatchingMovie { tmdb_id: 603 })
                .await,
            Some(PosterReference::new(
                "https://image.tmdb.org/t/p/original/p.jpg"
            ))
        );

        let head = server.await.unwrap().remove(0);
        assert!(head.starts_with("GET /movie/603?api_key=k3y "), "{head}");
    }

    #[tokio::test]
    async fn season_details_hit_the_season_endpoint() {
        let (base_url, server) =
            serve(vec![json("200 OK", r#"{"poster_path": "/s.jpg"}"#)]).await;

        let poster = resolver_at(base_url)
            .season_poster(1396, 3)
            .await
            .unwrap();
        assert_eq!(
            poster,
            Some(PosterReference::new("https://image.tmdb.org/t/p/original/s.jpg"))
        );

        let head = server.await.unwrap().remove(0);
        assert!(head.starts_with("GET /tv/1396/season/3?"), "{head}");
    }

    #[tokio::test]
    async fn error_statuses_map_to_provider_errors() {
        let (base_url, _server) = serve(vec![
            json("404 Not Found", r#"{"status_message": "gone"}"#),
            json("401 Unauthorized", r#"{"status_message": "bad key"}"#),
            json("429 Too Many Requests", "{}"),
            json("503 Service Unavailable", r#"{"status_message": "down"}"#),
        ])
        .await;
        let tmdb = resolver_at(base_url);

        assert!(matches!(
            tmdb.movie_poster(1).await,
            Err(ProviderError::NotFound)
        ));
        assert!(matches!(
            tmdb.movie_poster(1).await,
            Err(ProviderError::InvalidApiKey)
        ));
        assert!(matches!(
            tmdb.movie_poster(1).await,
            Err(ProviderError::RateLimited)
        ));
        match tmdb.movie_poster(1).await {
            Err(ProviderError::ApiError(message)) => assert_eq!(message, "down"),
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_title_resolves_to_none() {
        let (base_url, _server) =
            serve(vec![json("404 Not Found", r#"{"status_message": "gone"}"#)])
                .await;

        assert_eq!(
            resolver_at(base_url)
                .resolve(&WatchState::WatchingMovie { tmdb_id: 9 })
                .await,
            None
        );
    }
}

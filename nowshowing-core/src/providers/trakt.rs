//! Trakt "currently watching" polling.

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

use crate::{model::WatchState, pipeline::WatchSource};

/// Production API root.
pub const TRAKT_API_BASE: &str = "https://api.trakt.tv";
const TRAKT_API_VERSION: &str = "2";

/// Why a watching poll produced no payload.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Trakt could not be reached.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Trakt answered with something other than 200 or 204.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The 200 body is not a watching payload.
    #[error("malformed watching payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured API base is not an absolute URL.
    #[error("invalid Trakt base URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Who to poll and how to authenticate.
#[derive(Clone)]
pub struct TraktSettings {
    /// Trakt user slug.
    pub username: String,
    /// Sent as `trakt-api-key`.
    pub client_id: String,
    /// Optional OAuth token for private profiles.
    pub access_token: Option<String>,
    /// API root, [`TRAKT_API_BASE`] unless overridden.
    pub api_base: String,
}

impl TraktSettings {
    /// Settings for the production API without a token.
    pub fn new(username: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            client_id: client_id.into(),
            access_token: None,
            api_base: TRAKT_API_BASE.to_string(),
        }
    }

    /// Attach an OAuth token; blank tokens are dropped.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

impl fmt::Debug for TraktSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraktSettings")
            .field("username", &self.username)
            .field("client_id", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Body of `GET /users/{id}/watching`. Only the fields the pipeline needs.
#[derive(Debug, Default, Deserialize)]
pub struct WatchingResponse {
    /// `movie` or `episode`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Present when `kind` is `movie`.
    #[serde(default)]
    pub movie: Option<WatchedItem>,
    /// Present when `kind` is `episode`.
    #[serde(default)]
    pub show: Option<WatchedItem>,
    /// Present when `kind` is `episode`.
    #[serde(default)]
    pub episode: Option<WatchedEpisode>,
}

/// A movie or show entry.
#[derive(Debug, Default, Deserialize)]
pub struct WatchedItem {
    /// Cross-service ids.
    #[serde(default)]
    pub ids: Option<ItemIds>,
}

/// Cross-service ids of an item.
#[derive(Debug, Default, Deserialize)]
pub struct ItemIds {
    /// TMDB id, when Trakt knows it.
    #[serde(default)]
    pub tmdb: Option<u64>,
}

/// The episode being watched.
#[derive(Debug, Default, Deserialize)]
pub struct WatchedEpisode {
    /// Season number; 0 for specials.
    #[serde(default)]
    pub season: Option<u32>,
}

impl WatchedItem {
    fn tmdb_id(&self) -> Option<u64> {
        self.ids.as_ref().and_then(|ids| ids.tmdb)
    }
}

impl WatchingResponse {
    /// Parse a 200 body. Blank bodies mean nothing is playing.
    pub fn from_body(body: &str) -> Result<Option<Self>, serde_json::Error> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(body).map(Some)
    }

    /// Normalize into a [`WatchState`]. Any missing id reads as nothing.
    pub fn watch_state(&self) -> WatchState {
        match self.kind.as_deref() {
            Some("movie") => self
                .movie
                .as_ref()
                .and_then(WatchedItem::tmdb_id)
                .map(|tmdb_id| WatchState::WatchingMovie { tmdb_id })
                .unwrap_or_default(),
            Some("episode") => {
                let show = self.show.as_ref().and_then(WatchedItem::tmdb_id);
                let season = self.episode.as_ref().and_then(|ep| ep.season);
                match (show, season) {
                    (Some(show_tmdb_id), Some(season_number)) => {
                        WatchState::WatchingEpisode {
                            show_tmdb_id,
                            season_number,
                        }
                    }
                    _ => WatchState::Nothing,
                }
            }
            _ => WatchState::Nothing,
        }
    }
}

/// Polls one user's watching endpoint.
#[derive(Debug, Clone)]
pub struct TraktWatchPoller {
    http: reqwest::Client,
    settings: TraktSettings,
}

impl TraktWatchPoller {
    /// Poller sharing `http` with the rest of the pipeline.
    pub fn new(http: reqwest::Client, settings: TraktSettings) -> Self {
        Self { http, settings }
    }

    /// `{api_base}/users/{username}/watching`.
    pub fn watching_url(&self) -> Result<Url, TrackerError> {
        let mut url = Url::parse(&self.settings.api_base)?;
        url.path_segments_mut()
            .map_err(|_| TrackerError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["users", self.settings.username.as_str(), "watching"]);
        Ok(url)
    }

    /// Fetch and parse the raw payload. `Ok(None)` covers 204 and empty
    /// bodies.
    pub async fn fetch_watching(
        &self,
    ) -> Result<Option<WatchingResponse>, TrackerError> {
        let mut request = self
            .http
            .get(self.watching_url()?)
            .header(header::CONTENT_TYPE, "application/json")
            .header("trakt-api-key", &self.settings.client_id)
            .header("trakt-api-version", TRAKT_API_VERSION);
        if let Some(token) = &self.settings.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                Ok(WatchingResponse::from_body(&body)?)
            }
            StatusCode::NO_CONTENT => Ok(None),
            other => Err(TrackerError::Status(other.as_u16())),
        }
    }

    /// One poll. Never fails: every problem degrades to
    /// [`WatchState::Nothing`] after being logged.
    pub async fn poll(&self) -> WatchState {
        match self.fetch_watching().await {
            Ok(Some(payload)) => {
                let state = payload.watch_state();
                if state.is_nothing() {
                    debug!(
                        kind = payload.kind.as_deref().unwrap_or("<none>"),
                        "watching payload lacks the ids needed for a poster"
                    );
                }
                state
            }
            Ok(None) => WatchState::Nothing,
            Err(err) => {
                warn!(user = %self.settings.username, error = %err, "watching poll failed");
                WatchState::Nothing
            }
        }
    }
}

#[async_trait]
impl WatchSource for TraktWatchPoller {
    async fn poll(&self) -> WatchState {
        TraktWatchPoller::poll(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json, no_content, serve};

    fn state_of(body: &str) -> WatchState {
        WatchingResponse::from_body(body)
            .unwrap()
            .map(|payload| payload.watch_state())
            .unwrap_or_default()
    }

    #[test]
    fn movie_with_tmdb_id() {
        let body = r#"{
            "expires_at": "2024-01-01T00:00:00.000Z",
            "action": "scrobble",
            "type": "movie",
            "movie": {"title": "Heat", "year": 1995, "ids": {"trakt": 1, "tmdb": 949}}
        }"#;
        assert_eq!(state_of(body), WatchState::WatchingMovie { tmdb_id: 949 });
    }

    #[test]
    fn movie_without_tmdb_id_is_nothing() {
        let body = r#"{"type": "movie", "movie": {"ids": {"trakt": 1, "tmdb": null}}}"#;
        assert_eq!(state_of(body), WatchState::Nothing);
        assert_eq!(state_of(r#"{"type": "movie"}"#), WatchState::Nothing);
    }

    #[test]
    fn episode_with_show_and_season() {
        let body = r#"{
            "type": "episode",
            "episode": {"season": 3, "number": 7, "title": "Half Measures"},
            "show": {"title": "Breaking Bad", "ids": {"tmdb": 1396}}
        }"#;
        assert_eq!(
            state_of(body),
            WatchState::WatchingEpisode {
                show_tmdb_id: 1396,
                season_number: 3,
            }
        );
    }

    #[test]
    fn episode_without_season_is_nothing() {
        let body = r#"{
            "type": "episode",
            "episode": {"number": 7},
            "show": {"ids": {"tmdb": 1396}}
        }"#;
        assert_eq!(state_of(body), WatchState::Nothing);

        let body = r#"{"type": "episode", "show": {"ids": {"tmdb": 1396}}}"#;
        assert_eq!(state_of(body), WatchState::Nothing);
    }

    #[test]
    fn specials_season_zero_counts_as_present() {
        let body = r#"{
            "type": "episode",
            "episode": {"season": 0, "number": 1},
            "show": {"ids": {"tmdb": 76479}}
        }"#;
        assert_eq!(
            state_of(body),
            WatchState::WatchingEpisode {
                show_tmdb_id: 76479,
                season_number: 0,
            }
        );
    }

    #[test]
    fn episode_without_show_id_is_nothing() {
        let body = r#"{"type": "episode", "episode": {"season": 1}, "show": {"ids": {}}}"#;
        assert_eq!(state_of(body), WatchState::Nothing);
    }

    #[test]
    fn unknown_type_and_blank_body_are_nothing() {
        assert_eq!(state_of(r#"{"type": "podcast"}"#), WatchState::Nothing);
        assert_eq!(state_of("   "), WatchState::Nothing);
        assert!(WatchingResponse::from_body("not json").is_err());
    }

    #[test]
    fn watching_url_escapes_the_username() {
        let mut settings = TraktSettings::new("some user", "cid");
        settings.api_base = "https://api.trakt.tv/".into();
        let poller = TraktWatchPoller::new(reqwest::Client::new(), settings);
        assert_eq!(
            poller.watching_url().unwrap().as_str(),
            "https://api.trakt.tv/users/some%20user/watching"
        );
    }

    #[test]
    fn blank_access_token_is_ignored() {
        let settings =
            TraktSettings::new("u", "c").with_access_token(Some("  ".into()));
        assert_eq!(settings.access_token, None);
    }

    #[tokio::test]
    async fn transport_errors_degrade_to_nothing() {
        let mut settings = TraktSettings::new("alice", "cid");
        settings.api_base = "http://127.0.0.1:9".into();
        let poller = TraktWatchPoller::new(reqwest::Client::new(), settings);

        assert!(matches!(
            poller.fetch_watching().await,
            Err(TrackerError::Network(_))
        ));
        assert_eq!(poller.poll().await, WatchState::Nothing);
    }

    fn poller_at(base_url: String) -> TraktWatchPoller {
        let mut settings = TraktSettings::new("alice", "cid")
            .with_access_token(Some("tok".into()));
        settings.api_base = base_url;
        TraktWatchPoller::new(reqwest::Client::new(), settings)
    }

    #[tokio::test]
    async fn no_content_means_nothing_playing() {
        let (base_url, server) = serve(vec![no_content(), no_content()]).await;
        let poller = poller_at(base_url);

        assert!(matches!(poller.fetch_watching().await, Ok(None)));
        assert_eq!(poller.poll().await, WatchState::Nothing);

        let requests = server.await.unwrap();
        let head = requests[0].to_ascii_lowercase();
        assert!(head.starts_with("get /users/alice/watching "), "{head}");
        assert!(head.contains("trakt-api-key: cid"), "{head}");
        assert!(head.contains("trakt-api-version: 2"), "{head}");
        assert!(head.contains("authorization: bearer tok"), "{head}");
    }

    #[tokio::test]
    async fn server_errors_are_reported_and_degrade_to_nothing() {
        let error = json("500 Internal Server Error", "{}");
        let (base_url, _server) = serve(vec![error.clone(), error]).await;
        let poller = poller_at(base_url);

        assert!(matches!(
            poller.fetch_watching().await,
            Err(TrackerError::Status(500))
        ));
        assert_eq!(poller.poll().await, WatchState::Nothing);
    }

    #[tokio::test]
    async fn episode_payload_is_polled_into_a_season() {
        let body = r#"{"type": "episode", "episode": {"season": 2, "number": 4},
            "show": {"ids": {"trakt": 9, "tmdb": 5}}}"#;
        let (base_url, _server) = serve(vec![json("200 OK", body)]).await;

        assert_eq!(
            poller_at(base_url).poll().await,
            WatchState::WatchingEpisode {
                show_tmdb_id: 5,
                season_number: 2,
            }
        );
    }

    #[tokio::test]
    async fn garbled_payload_degrades_to_nothing() {
        let (base_url, _server) =
            serve(vec![json("200 OK", "{not json"), json("200 OK", "{not json")])
                .await;
        let poller = poller_at(base_url);

        assert!(matches!(
            poller.fetch_watching().await,
            Err(TrackerError::Parse(_))
        ));
        assert_eq!(poller.poll().await, WatchState::Nothing);
    }
}

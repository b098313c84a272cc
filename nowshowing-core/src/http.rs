//! Shared HTTP client and poster downloads.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{DisplayError, Result},
    model::PosterReference,
};

/// Per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("nowshowing/", env!("CARGO_PKG_VERSION"));

/// Shared client for Trakt, TMDB and the image CDN.
///
/// The timeout bounds every request so one stalled call cannot hold up the
/// polling loop indefinitely.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .user_agent(USER_AGENT)
        .build()
}

/// Downloads raw poster bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the image behind `reference`.
    async fn fetch(&self, reference: &PosterReference) -> Result<Vec<u8>>;
}

/// [`ImageFetcher`] over plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl HttpImageFetcher {
    /// Fetcher using the shared client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, reference: &PosterReference) -> Result<Vec<u8>> {
        debug!(url = %reference, "fetching poster");
        let response = self.http.get(reference.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DisplayError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

//! Trakt OAuth 2 authorization-code flow for a device without a browser.
//!
//! The user opens [`TraktOAuth::authorize_url`] elsewhere, approves the app
//! and pastes back the URL they were redirected to.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
    constants::{TRAKT_AUTHORIZE_URL, TRAKT_TOKEN_URL},
    credentials::Credentials,
};

/// Failures during authorization or token refresh.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The token endpoint could not be reached.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The token endpoint rejected the request.
    #[error("token endpoint returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for the error message.
        body: String,
    },
    /// The pasted redirect is not a URL.
    #[error("redirect URL is not a valid URL: {0}")]
    InvalidRedirect(#[from] url::ParseError),
    /// The pasted redirect carries no authorization code.
    #[error("redirect URL has no `code` parameter")]
    MissingCode,
    /// A refresh was requested but the store has no refresh token.
    #[error("no refresh token stored; run setup again")]
    MissingRefreshToken,
}

/// Token endpoint response. Only the two tokens are required.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Token used to obtain the next pair.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Issue time as a Unix timestamp.
    #[serde(default)]
    pub created_at: Option<u64>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

/// Client for the Trakt OAuth endpoints.
#[derive(Clone)]
pub struct TraktOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_base: String,
    token_url: String,
}

impl fmt::Debug for TraktOAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraktOAuth")
            .field("redirect_uri", &self.redirect_uri)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl TraktOAuth {
    /// Client using the Trakt app registration from `credentials`.
    pub fn new(http: reqwest::Client, credentials: &Credentials) -> Self {
        Self {
            http,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            redirect_uri: credentials.redirect_uri.clone(),
            authorize_base: TRAKT_AUTHORIZE_URL.to_string(),
            token_url: TRAKT_TOKEN_URL.to_string(),
        }
    }

    /// Point the token exchange somewhere else (staging, tests).
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// URL the user opens to approve the application.
    pub fn authorize_url(&self) -> Result<Url, OAuthError> {
        Ok(Url::parse_with_params(
            &self.authorize_base,
            [
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ],
        )?)
    }

    /// Pull the `code` query parameter out of the pasted redirect URL.
    pub fn extract_code(redirected: &str) -> Result<String, OAuthError> {
        let url = Url::parse(redirected.trim())?;
        url.query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty())
            .ok_or(OAuthError::MissingCode)
    }

    /// Accept either the full redirect URL or, for the out-of-band redirect,
    /// the bare code Trakt displays.
    pub fn code_from_input(input: &str) -> Result<String, OAuthError> {
        let trimmed = input.trim();
        if trimmed.contains("://") {
            return Self::extract_code(trimmed);
        }
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(OAuthError::MissingCode);
        }
        Ok(trimmed.to_string())
    }

    /// Trade an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenPair, OAuthError> {
        info!("exchanging authorization code for tokens");
        self.request_tokens(TokenRequest {
            code: Some(code),
            refresh_token: None,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            grant_type: "authorization_code",
        })
        .await
    }

    /// Trade a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, OAuthError> {
        info!("refreshing access token");
        self.request_tokens(TokenRequest {
            code: None,
            refresh_token: Some(refresh_token),
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            grant_type: "refresh_token",
        })
        .await
    }

    async fn request_tokens(
        &self,
        body: TokenRequest<'_>,
    ) -> Result<TokenPair, OAuthError> {
        let response = self.http.post(&self.token_url).json(&body).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), grant = body.grant_type, "token endpoint answered");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<TokenPair>().await?)
    }
}

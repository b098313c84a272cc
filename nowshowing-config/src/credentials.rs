//! The `config.json` credential store written during setup.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::util::redact;

/// Failures reading or writing the credential store.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No store at the expected path.
    #[error("credential store {path} not found; run `nowshowing-init setup` first")]
    Missing {
        /// Store path.
        path: PathBuf,
    },
    /// The store exists but could not be read.
    #[error("failed to read credential store {path}")]
    Read {
        /// Store path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The store is not valid JSON.
    #[error("failed to parse credential store {path}")]
    Parse {
        /// Store path.
        path: PathBuf,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The store could not be replaced.
    #[error("failed to write credential store {path}")]
    Write {
        /// Store path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Serializing the credentials failed.
    #[error("failed to serialize credentials")]
    Serialize(#[source] serde_json::Error),
}

/// Flat key/value record persisted as JSON.
///
/// Field names match the keys a hand-written `config.json` uses, so older
/// stores load without migration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Trakt user whose watch state is polled.
    pub trakt_username: String,
    /// Trakt API client id, sent as `trakt-api-key`.
    pub client_id: String,
    /// Trakt API client secret, used only for token exchange.
    pub client_secret: String,
    /// OAuth redirect registered with the Trakt application.
    pub redirect_uri: String,
    /// TMDB v3 API key.
    pub tmdb_api_key: String,
    /// Trakt bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Trakt refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// True when a non-blank access token is stored.
    pub fn has_tokens(&self) -> bool {
        self.access_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }

    /// Copy with every secret shortened for printing.
    pub fn redacted(&self) -> Self {
        let mask_opt = |value: &Option<String>| value.as_deref().map(redact);
        Self {
            trakt_username: self.trakt_username.clone(),
            client_id: redact(&self.client_id),
            client_secret: redact(&self.client_secret),
            redirect_uri: self.redirect_uri.clone(),
            tmdb_api_key: redact(&self.tmdb_api_key),
            access_token: mask_opt(&self.access_token),
            refresh_token: mask_opt(&self.refresh_token),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = |value: &str| if value.is_empty() { "<empty>" } else { "<set>" };
        f.debug_struct("Credentials")
            .field("trakt_username", &self.trakt_username)
            .field("client_id", &present(&self.client_id))
            .field("client_secret", &present(&self.client_secret))
            .field("redirect_uri", &self.redirect_uri)
            .field("tmdb_api_key", &present(&self.tmdb_api_key))
            .field("access_token", &self.access_token.as_deref().map(present))
            .field("refresh_token", &self.refresh_token.as_deref().map(present))
            .finish()
    }
}

/// The JSON credential file on disk.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at `path`; nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and parse the store.
    pub fn load(&self) -> Result<Credentials, CredentialError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CredentialError::Missing {
                    path: self.path.clone(),
                }
            } else {
                CredentialError::Read {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&raw).map_err(|source| CredentialError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Like [`load`](Self::load) but a missing file yields empty credentials.
    pub fn load_or_default(&self) -> Result<Credentials, CredentialError> {
        match self.load() {
            Err(CredentialError::Missing { .. }) => Ok(Credentials::default()),
            other => other,
        }
    }

    /// Replace the store atomically; readers never see a partial file.
    pub fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        let mut body = serde_json::to_vec_pretty(credentials)
            .map_err(CredentialError::Serialize)?;
        body.push(b'\n');

        let write_err = |source: std::io::Error| CredentialError::Write {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&body).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path)
            .map_err(|err| write_err(err.error))?;
        tracing::debug!(path = %self.path.display(), "credential store saved");
        Ok(())
    }

    /// Store a fresh token pair, keeping every other field.
    pub fn update_tokens(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<Credentials, CredentialError> {
        let mut credentials = self.load()?;
        credentials.access_token = Some(access_token);
        if refresh_token.is_some() {
            credentials.refresh_token = refresh_token;
        }
        self.save(&credentials)?;
        Ok(credentials)
    }
}

//! Session state the host exposes to plugins through accessor calls.
//!
//! A [`HostSession`] mirrors the CLI's `config.json`: the targeted API,
//! tokens, and the selected organisation and space. Identity fields
//! (username, GUID, e-mail) are not stored; they are decoded from the access
//! token's claims on demand. The session is shared through a
//! [`SessionHandle`], which readers lock briefly and only core commands
//! mutate.

mod claims;

use std::fs;
use std::io;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use self::claims::TokenClaims;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Name and GUID of a targeted organisation or space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TargetFields {
    /// Resource GUID; empty when nothing is targeted.
    #[serde(rename = "GUID")]
    pub guid: String,
    /// Resource name.
    pub name: String,
}

impl TargetFields {
    /// Creates a target reference.
    #[must_use]
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
        }
    }

    /// Returns `true` when a resource is selected.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !self.guid.is_empty()
    }
}

/// Ambient CLI configuration read by the host call surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HostSession {
    /// Targeted API endpoint.
    pub target: String,
    /// API version reported by the target.
    #[serde(rename = "APIVersion")]
    pub api_version: String,
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Targeted organisation.
    pub organization_fields: TargetFields,
    /// Targeted space.
    pub space_fields: TargetFields,
    /// Whether SSL certificate validation is disabled.
    #[serde(rename = "SSLDisabled")]
    pub ssl_disabled: bool,
    /// Doppler logging endpoint.
    #[serde(rename = "DopplerEndPoint")]
    pub doppler_endpoint: String,
    /// UAA endpoint.
    pub uaa_endpoint: String,
}

impl HostSession {
    /// Decodes the access token's claims; an absent or opaque token yields
    /// empty claims.
    #[must_use]
    pub fn claims(&self) -> TokenClaims {
        TokenClaims::decode(&self.access_token).unwrap_or_default()
    }

    /// Username from the access token.
    #[must_use]
    pub fn username(&self) -> String {
        self.claims().user_name
    }

    /// User GUID from the access token.
    #[must_use]
    pub fn user_guid(&self) -> String {
        self.claims().user_id
    }

    /// E-mail address from the access token.
    #[must_use]
    pub fn user_email(&self) -> String {
        self.claims().email
    }

    /// Returns `true` when an access token is present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// Returns `true` when an organisation is targeted.
    #[must_use]
    pub fn has_organization(&self) -> bool {
        self.organization_fields.is_set()
    }

    /// Returns `true` when a space is targeted.
    #[must_use]
    pub fn has_space(&self) -> bool {
        self.space_fields.is_set()
    }

    /// Returns `true` when an API endpoint is targeted.
    #[must_use]
    pub fn has_api_endpoint(&self) -> bool {
        !self.target.is_empty()
    }

    /// Loggregator endpoint; the platform no longer advertises one.
    #[must_use]
    pub const fn loggregator_endpoint(&self) -> &'static str {
        ""
    }
}

/// Shared, lock-protected session with an optional backing file.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<HostSession>>,
    path: Option<Arc<Utf8PathBuf>>,
}

impl SessionHandle {
    /// Wraps an in-memory session that is never persisted.
    #[must_use]
    pub fn in_memory(session: HostSession) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
            path: None,
        }
    }

    /// Loads the session from `path`; a missing file yields an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self, SessionError> {
        let session = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => HostSession::default(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| SessionError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(target: SESSION_TARGET, %path, "no session file; starting logged out");
                HostSession::default()
            }
            Err(source) => {
                return Err(SessionError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(Self {
            inner: Arc::new(RwLock::new(session)),
            path: Some(Arc::new(path.to_path_buf())),
        })
    }

    /// Returns a read guard over the session.
    pub fn read(&self) -> RwLockReadGuard<'_, HostSession> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> HostSession {
        self.read().clone()
    }

    /// Applies `change` and persists the result when the session is file
    /// backed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub fn update(&self, change: impl FnOnce(&mut HostSession)) -> Result<(), SessionError> {
        let updated = {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            change(&mut guard);
            guard.clone()
        };
        match &self.path {
            Some(path) => save(path, &updated),
            None => Ok(()),
        }
    }
}

fn save(path: &Utf8Path, session: &HostSession) -> Result<(), SessionError> {
    let write_error = |source| SessionError::Write {
        path: path.to_path_buf(),
        source,
    };
    let bytes = serde_json::to_vec_pretty(session)
        .map_err(|error| write_error(io::Error::new(io::ErrorKind::InvalidData, error)))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, bytes).map_err(write_error)
}

/// Errors raised while loading or saving the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The file could not be read.
    #[error("failed to read session file '{path}': {source}")]
    Read {
        /// Session file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid session JSON.
    #[error("failed to parse session file '{path}': {source}")]
    Parse {
        /// Session file.
        path: Utf8PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The file could not be written.
    #[error("failed to write session file '{path}': {source}")]
    Write {
        /// Session file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

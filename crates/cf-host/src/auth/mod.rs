//! Access token refresh for the `AccessToken` host call.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::session::SessionHandle;

/// Produces a valid access token for the current session.
///
/// Talking to the UAA is an external concern; the host only needs a token
/// or a reason it cannot have one.
pub trait Authenticator: Send + Sync {
    /// Returns a current access token, refreshing it when necessary.
    ///
    /// # Errors
    ///
    /// Returns an error when no valid token can be produced. Callers must
    /// surface it rather than fall back to the stored token.
    fn refresh_token(&self, session: &SessionHandle) -> Result<String, AuthError>;
}

/// Failures raised while refreshing an access token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The session holds no access token.
    #[error("not logged in; run 'cf login' first")]
    NotLoggedIn,
    /// The stored token has expired and cannot be refreshed locally.
    #[error("access token expired at {expired_at}; run 'cf login' again")]
    TokenExpired {
        /// Expiry in seconds since the Unix epoch.
        expired_at: u64,
    },
    /// The refresh endpoint rejected the request.
    #[error("token refresh failed: {message}")]
    Refresh {
        /// Reason reported by the identity provider.
        message: String,
    },
}

/// Serves the stored token while its expiry claim lies in the future.
pub struct StoredTokenAuthenticator {
    clock: fn() -> SystemTime,
}

impl StoredTokenAuthenticator {
    /// Creates an authenticator reading the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemTime::now)
    }

    /// Creates an authenticator reading `clock`.
    #[must_use]
    pub const fn with_clock(clock: fn() -> SystemTime) -> Self {
        Self { clock }
    }

    fn now_secs(&self) -> u64 {
        (self.clock)()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

impl Default for StoredTokenAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator for StoredTokenAuthenticator {
    fn refresh_token(&self, session: &SessionHandle) -> Result<String, AuthError> {
        let current = session.snapshot();
        if !current.is_logged_in() {
            return Err(AuthError::NotLoggedIn);
        }
        match current.claims().exp {
            Some(expired_at) if expired_at <= self.now_secs() => {
                Err(AuthError::TokenExpired { expired_at })
            }
            _ => Ok(current.access_token),
        }
    }
}

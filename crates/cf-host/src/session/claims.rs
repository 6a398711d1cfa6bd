//! Access token claim decoding.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// Identity and expiry claims carried by a UAA access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenClaims {
    /// Login name.
    pub user_name: String,
    /// User GUID.
    pub user_id: String,
    /// E-mail address.
    pub email: String,
    /// Expiry as seconds since the Unix epoch.
    pub exp: Option<u64>,
}

impl TokenClaims {
    /// Decodes the payload segment of a JWT, tolerating a `bearer` prefix
    /// and padded encodings. Returns `None` for anything that is not a JWT.
    #[must_use]
    pub fn decode(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        let raw = trimmed
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map_or(trimmed, |(_, rest)| rest.trim());
        let payload = raw.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

//! Identity credential and locally decoded profile
//!
//! The credential is an opaque bearer token as far as the processing
//! endpoint is concerned. Its claims are decoded here only to show the
//! signed-in user's name, email and picture; the signature is never
//! checked locally.

use crate::types::{AppError, AppResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

/// Opaque bearer token returned by the sign-in provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Surrounding whitespace is dropped.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Decode the display fields carried in the token's claims.
    pub fn decode_profile(&self) -> AppResult<UserProfile> {
        let token = self.0.as_str();

        // Validates the overall shape and the header segment
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AppError::Credential(format!("malformed token header: {}", e)))?;

        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| AppError::Credential("token has no payload segment".to_string()))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AppError::Credential(format!("payload is not base64url: {}", e)))?;

        let profile: UserProfile = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Credential(format!("payload is not a claims object: {}", e)))?;

        tracing::debug!(
            alg = ?header.alg,
            has_name = profile.name.is_some(),
            "Decoded credential claims"
        );
        Ok(profile)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Credential::new(s)
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Credential::new(s)
    }
}

/// Display-only identity fields taken from the credential.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl UserProfile {
    /// Name used in the "Welcome back" greeting.
    pub fn greeting_name(profile: Option<&UserProfile>) -> &str {
        profile.and_then(|p| p.name.as_deref()).unwrap_or("Guest")
    }

    /// Name shown on the profile card.
    pub fn card_name(profile: Option<&UserProfile>) -> &str {
        profile.and_then(|p| p.name.as_deref()).unwrap_or("Guest User")
    }

    /// Email shown on the profile card.
    pub fn card_email(profile: Option<&UserProfile>) -> &str {
        profile
            .and_then(|p| p.email.as_deref())
            .unwrap_or("Not logged in")
    }
}

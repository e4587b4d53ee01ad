//! Password-grant sign-in against the identity provider
//!
//! The gateway makes exactly one network call per sign-in attempt and never
//! retries: a transient upstream failure surfaces as `AuthenticationFailed`
//! rather than being retried, since retrying a password grant risks tripping
//! lockout policies on the provider side.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{CartgateError, Result};

/// A session token issued by the identity provider
///
/// The token string is opaque to the gateway; only the verifier ever looks
/// inside it. `expires_at` is a computed UTC timestamp derived from the
/// `expires_in` seconds in the grant response, so expiry can be checked
/// without another round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    /// The access token string issued by the provider
    pub access_token: String,

    /// The token type, typically `"bearer"`
    pub token_type: String,

    /// UTC timestamp at which the access token expires, when the provider
    /// reported one
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Returns `true` when the token is expired or about to expire
    ///
    /// A 60-second buffer is applied so callers have time to sign in again
    /// before the token is rejected. Tokens without a reported expiry are
    /// treated as non-expiring.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(60);
                Utc::now() >= expires_at - buffer
            }
        }
    }
}

/// Raw JSON response from the provider's password-grant endpoint
#[derive(Debug, Deserialize)]
struct GrantResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl GrantResponse {
    /// Convert the raw grant response into an [`AuthToken`]
    ///
    /// An `expires_in` too large to represent as a timestamp offset is
    /// treated as no reported expiry rather than trusted.
    fn into_auth_token(self) -> AuthToken {
        let expires_at = self.expires_in.and_then(|secs| {
            let ttl = chrono::Duration::try_seconds(i64::try_from(secs).ok()?)?;
            Some(Utc::now() + ttl)
        });

        AuthToken {
            access_token: self.access_token,
            token_type: self.token_type,
            expires_at,
        }
    }
}

/// Exchanges a credential pair for a session token
pub struct SignInGateway {
    http: Arc<reqwest::Client>,
    token_url: String,
    api_key: String,
}

impl SignInGateway {
    /// Create a gateway for the configured identity provider
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client for all provider requests.
    /// * `config` - Provider endpoint and api key.
    pub fn new(http: Arc<reqwest::Client>, config: &AuthConfig) -> Self {
        Self {
            http,
            token_url: config.token_url(),
            api_key: config.api_key.clone(),
        }
    }

    /// Exchange an email/password pair for a session token
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::AuthenticationFailed`] wrapping the upstream
    /// error message on wrong credentials or any upstream failure. Sign-in
    /// errors are operational, not security-sensitive, so the upstream text
    /// is preserved.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthToken> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let resp = self
            .http
            .post(&self.token_url)
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CartgateError::AuthenticationFailed(format!("grant request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::debug!(%status, "password grant rejected");
            return Err(CartgateError::AuthenticationFailed(format!("{status}: {text}")).into());
        }

        let raw: GrantResponse = resp.json().await.map_err(|e| {
            CartgateError::AuthenticationFailed(format!("unreadable grant response: {e}"))
        })?;

        Ok(raw.into_auth_token())
    }
}

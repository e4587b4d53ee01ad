//! Identity provider key set cache
//!
//! The provider publishes its public signing keys as a JWKS document and
//! rotates them without notice. [`KeySetCache`] indexes the keys by `kid` and
//! refetches the whole document on a cache miss, so rotation is handled
//! transparently at the cost of one extra round trip on the first request
//! after a rotation.
//!
//! The indexed map is replaced wholesale under a write lock: concurrent
//! readers observe either the old set or the fully replaced new one, never a
//! partial set. A minimum interval between forced refreshes bounds the load
//! an attacker can generate by probing with forged key ids; a miss inside the
//! interval fails `KeyNotFound` without any network call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};

use crate::error::{CartgateError, Result};

/// Default minimum interval between forced key set refetches
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// One public signing key from the provider's JWKS document
///
/// Only the members cartgate verifies with are modeled: RSA keys carry
/// `n`/`e`, Ed25519 keys carry `crv`/`x`. Unknown members are ignored on
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key id, the index the cache is keyed by
    pub kid: String,

    /// Key type: `RSA` or `OKP`
    pub kty: String,

    /// Algorithm the provider advertises for this key, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// RSA modulus, base64url without padding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent, base64url without padding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// OKP curve name, expected `Ed25519`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// OKP public key, base64url without padding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
}

impl Jwk {
    /// The verification algorithm implied by this key's type
    ///
    /// The expected algorithm is derived server-side from the key itself and
    /// never from the token header, so a caller cannot steer verification to
    /// a different routine than the key's own type.
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::KeyNotFound`] for key types cartgate cannot
    /// verify with, as if the key were absent from the set.
    pub fn expected_algorithm(&self) -> Result<Algorithm> {
        match self.kty.as_str() {
            "RSA" => Ok(Algorithm::RS256),
            "OKP" => Ok(Algorithm::EdDSA),
            other => {
                tracing::warn!(kid = %self.kid, kty = other, "unsupported key type in key set");
                Err(CartgateError::KeyNotFound(self.kid.clone()).into())
            }
        }
    }

    /// Build the `jsonwebtoken` decoding key for this JWK
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::KeyNotFound`] when the key material members
    /// required for the key's type are missing or undecodable.
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        let unusable = || CartgateError::KeyNotFound(self.kid.clone());
        match self.kty.as_str() {
            "RSA" => {
                let n = self.n.as_deref().ok_or_else(unusable)?;
                let e = self.e.as_deref().ok_or_else(unusable)?;
                DecodingKey::from_rsa_components(n, e).map_err(|err| {
                    tracing::warn!(kid = %self.kid, error = %err, "unusable RSA key material");
                    unusable().into()
                })
            }
            "OKP" => {
                if self.crv.as_deref() != Some("Ed25519") {
                    tracing::warn!(kid = %self.kid, crv = ?self.crv, "unsupported OKP curve");
                    return Err(unusable().into());
                }
                let x = self.x.as_deref().ok_or_else(unusable)?;
                DecodingKey::from_ed_components(x).map_err(|err| {
                    tracing::warn!(kid = %self.kid, error = %err, "unusable Ed25519 key material");
                    unusable().into()
                })
            }
            _ => Err(unusable().into()),
        }
    }
}

/// The JWKS document shape published by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

/// Refetch-on-miss cache of the provider's signing keys, indexed by `kid`
///
/// Read-mostly and safe for concurrent readers; the only write is the
/// wholesale map replacement after a refetch.
pub struct KeySetCache {
    http: Arc<reqwest::Client>,
    jwks_url: String,
    keys: RwLock<HashMap<String, Jwk>>,
    last_refresh: Mutex<Option<Instant>>,
    min_refresh_interval: Duration,
}

impl KeySetCache {
    /// Create a cache fetching from `jwks_url` with the default refresh
    /// rate limit
    pub fn new(http: Arc<reqwest::Client>, jwks_url: String) -> Self {
        Self::with_min_refresh_interval(http, jwks_url, DEFAULT_MIN_REFRESH_INTERVAL)
    }

    /// Create a cache with an explicit minimum interval between refetches
    ///
    /// A zero interval disables the rate limit; tests exercising rotation
    /// use that to force a refetch per miss.
    pub fn with_min_refresh_interval(
        http: Arc<reqwest::Client>,
        jwks_url: String,
        min_refresh_interval: Duration,
    ) -> Self {
        Self {
            http,
            jwks_url,
            keys: RwLock::new(HashMap::new()),
            last_refresh: Mutex::new(None),
            min_refresh_interval,
        }
    }

    /// Resolve a signing key by its key id
    ///
    /// On a miss the full key set is refetched and the index replaced
    /// wholesale, then the lookup is retried once against the fresh set.
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::KeyNotFound`] when the freshly fetched set
    /// still lacks `kid` (stale token after rotation, or a forged key id),
    /// when the miss falls inside the refresh rate-limit window, or when the
    /// JWKS document cannot be fetched. A failed fetch releases the claimed
    /// refresh slot so the next miss retries immediately instead of waiting
    /// out the window.
    pub async fn get_key(&self, kid: &str) -> Result<Jwk> {
        if let Some(key) = self.lookup(kid) {
            return Ok(key);
        }

        if !self.may_refresh() {
            tracing::debug!(kid, "key miss inside refresh rate-limit window");
            return Err(CartgateError::KeyNotFound(kid.to_string()).into());
        }

        if let Err(err) = self.refresh().await {
            self.release_refresh_slot();
            tracing::warn!(kid, error = %err, "key set refresh failed");
            return Err(CartgateError::KeyNotFound(kid.to_string()).into());
        }

        self.lookup(kid)
            .ok_or_else(|| CartgateError::KeyNotFound(kid.to_string()).into())
    }

    /// Look up a key in the current set
    fn lookup(&self, kid: &str) -> Option<Jwk> {
        self.keys
            .read()
            .expect("key set lock poisoned")
            .get(kid)
            .cloned()
    }

    /// Check the rate limit and claim a refresh slot if allowed
    ///
    /// The slot is claimed before the fetch so that a burst of concurrent
    /// forged-kid probes triggers at most one fetch per interval.
    fn may_refresh(&self) -> bool {
        let mut last = self.last_refresh.lock().expect("refresh lock poisoned");
        match *last {
            Some(at) if at.elapsed() < self.min_refresh_interval => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }

    /// Give back a claimed refresh slot after a failed fetch
    fn release_refresh_slot(&self) {
        *self.last_refresh.lock().expect("refresh lock poisoned") = None;
    }

    /// Fetch the JWKS document and replace the indexed set wholesale
    async fn refresh(&self) -> Result<()> {
        tracing::debug!(url = %self.jwks_url, "refreshing identity provider key set");

        let jwks: Jwks = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(CartgateError::Http)?
            .error_for_status()
            .map_err(CartgateError::Http)?
            .json()
            .await
            .map_err(CartgateError::Http)?;

        let fresh: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(key_count = fresh.len(), "key set replaced");
        *self.keys.write().expect("key set lock poisoned") = fresh;
        Ok(())
    }
}

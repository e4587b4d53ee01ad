//! Shared helpers for the integration suites
//!
//! Provides deterministic Ed25519 test keys that can both mint signed tokens
//! (via `jsonwebtoken`) and publish themselves as JWKS entries for a mock
//! identity provider.

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Issuer the test verifier expects
pub const ISSUER: &str = "https://idp.test.example/auth/v1";

/// Audience the test verifier expects
pub const AUDIENCE: &str = "authenticated";

/// Claims shape for minting test tokens
#[derive(Debug, Clone, Serialize)]
pub struct TestClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl TestClaims {
    /// Claims that a correctly configured verifier accepts
    pub fn valid(sub: &str) -> Self {
        Self {
            sub: sub.to_string(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            email: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_issuer(mut self, iss: &str) -> Self {
        self.iss = iss.to_string();
        self
    }

    pub fn with_audience(mut self, aud: &str) -> Self {
        self.aud = aud.to_string();
        self
    }

    pub fn expired(mut self) -> Self {
        self.exp = chrono::Utc::now().timestamp() - 120;
        self
    }
}

/// A deterministic Ed25519 signing key with a key id
pub struct TestKey {
    pub kid: String,
    signing: SigningKey,
}

impl TestKey {
    /// Derive a key from a fixed seed byte so test runs are reproducible
    pub fn new(kid: &str, seed: u8) -> Self {
        Self {
            kid: kid.to_string(),
            signing: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    /// The JWKS entry for this key's public half
    pub fn jwk(&self) -> serde_json::Value {
        let x = URL_SAFE_NO_PAD.encode(self.signing.verifying_key().to_bytes());
        serde_json::json!({
            "kid": self.kid,
            "kty": "OKP",
            "crv": "Ed25519",
            "alg": "EdDSA",
            "use": "sig",
            "x": x,
        })
    }

    /// Sign claims into a compact token with this key's kid in the header
    pub fn sign(&self, claims: &TestClaims) -> String {
        self.sign_with_kid(&self.kid, claims)
    }

    /// Sign claims but declare a different kid in the header
    pub fn sign_with_kid(&self, kid: &str, claims: &TestClaims) -> String {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(kid.to_string());
        let der = self.signing.to_pkcs8_der().expect("pkcs8 encode");
        let key = EncodingKey::from_ed_der(der.as_bytes());
        encode(&header, claims, &key).expect("sign token")
    }
}

/// A JWKS document body holding the given keys
pub fn jwks_body(keys: &[&TestKey]) -> serde_json::Value {
    serde_json::json!({
        "keys": keys.iter().map(|k| k.jwk()).collect::<Vec<_>>(),
    })
}

/// Hand-craft a token whose header declares `alg` without actually signing
/// with it; the signature bytes are garbage
pub fn forged_alg_token(kid: &str, alg: &str, claims: &TestClaims) -> String {
    let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{alg}","typ":"JWT","kid":"{kid}"}}"#));
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_string(claims).expect("claims json"));
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

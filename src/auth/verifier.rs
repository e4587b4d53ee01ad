//! Bearer token verification
//!
//! Verifies tokens cartgate did not issue: the header is parsed unverified to
//! learn which provider key signed the token, the key is resolved through the
//! [`KeySetCache`], and the signature and claims are checked in one pass with
//! the algorithm pinned to the one the resolved key implies. A failed
//! verification is terminal for the call; the caller must obtain a fresh
//! token.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;

use crate::error::{CartgateError, Result};

use super::keyset::KeySetCache;

/// The claims cartgate reads out of a verified token
///
/// Issuer, audience and expiry are checked by the validation pass and do not
/// need to be read back; only the subject and the optional email survive into
/// the [`AuthenticatedIdentity`].
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// The caller identity extracted from a verified token
///
/// Derived transiently per call; it has no lifecycle of its own and is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Unique subject of the token
    pub subject: String,
    /// Email claim, or a derived placeholder when the claim is absent
    pub email: String,
}

/// Verifies presented bearer tokens against the provider's key set
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    issuer: String,
    audience: String,
}

impl TokenVerifier {
    /// Create a verifier expecting the given issuer and audience exactly
    pub fn new(keys: Arc<KeySetCache>, issuer: String, audience: String) -> Self {
        Self {
            keys,
            issuer,
            audience,
        }
    }

    /// Verify a presented token and extract the caller's identity
    ///
    /// # Errors
    ///
    /// - [`CartgateError::InvalidToken`] - malformed structure or unparseable
    ///   header; no network call has been made at this point
    /// - [`CartgateError::KeyNotFound`] - the provider's current key set has
    ///   no key matching the token's `kid`
    /// - [`CartgateError::SignatureInvalid`] - signature mismatch, or a
    ///   header-declared algorithm differing from the resolved key's own
    /// - [`CartgateError::ClaimsInvalid`] - wrong issuer or audience, expired,
    ///   or missing/empty subject
    pub async fn verify(&self, token: &str) -> Result<AuthenticatedIdentity> {
        let header =
            decode_header(token).map_err(|e| CartgateError::InvalidToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| CartgateError::InvalidToken("header has no kid".to_string()))?;

        let jwk = self.keys.get_key(&kid).await?;

        // The verification algorithm comes from the key, never the header.
        let expected_alg = jwk.expected_algorithm()?;
        if header.alg != expected_alg {
            tracing::warn!(
                kid,
                declared = ?header.alg,
                expected = ?expected_alg,
                "token declared an algorithm its signing key does not use"
            );
            return Err(CartgateError::SignatureInvalid.into());
        }

        let mut validation = Validation::new(expected_alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &jwk.decoding_key()?, &validation)
            .map_err(|e| map_validation_error(&e))?;

        let subject = match data.claims.sub {
            Some(sub) if !sub.is_empty() => sub,
            _ => {
                return Err(
                    CartgateError::ClaimsInvalid("missing subject claim".to_string()).into(),
                )
            }
        };

        let email = data
            .claims
            .email
            .unwrap_or_else(|| placeholder_email(&subject));

        tracing::debug!(subject = %subject, "token verified");
        Ok(AuthenticatedIdentity { subject, email })
    }
}

/// Map a `jsonwebtoken` failure onto the cartgate taxonomy
fn map_validation_error(err: &jsonwebtoken::errors::Error) -> CartgateError {
    match err.kind() {
        ErrorKind::InvalidSignature => CartgateError::SignatureInvalid,
        ErrorKind::ExpiredSignature
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::MissingRequiredClaim(_) => CartgateError::ClaimsInvalid(err.to_string()),
        _ => CartgateError::InvalidToken(err.to_string()),
    }
}

/// Placeholder email for tokens without an `email` claim
///
/// Usability shim for profile display only; nothing downstream trusts it.
fn placeholder_email(subject: &str) -> String {
    let prefix: String = subject.chars().take(8).collect();
    format!("{prefix}@example.com")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_email_uses_subject_prefix() {
        assert_eq!(
            placeholder_email("8f2c41d0-aaaa-bbbb"),
            "8f2c41d0@example.com"
        );
    }

    #[test]
    fn test_placeholder_email_short_subject() {
        assert_eq!(placeholder_email("bob"), "bob@example.com");
    }

    #[test]
    fn test_expired_maps_to_claims_invalid() {
        let err = jsonwebtoken::errors::Error::from(ErrorKind::ExpiredSignature);
        assert!(matches!(
            map_validation_error(&err),
            CartgateError::ClaimsInvalid(_)
        ));
    }

    #[test]
    fn test_wrong_audience_maps_to_claims_invalid() {
        let err = jsonwebtoken::errors::Error::from(ErrorKind::InvalidAudience);
        assert!(matches!(
            map_validation_error(&err),
            CartgateError::ClaimsInvalid(_)
        ));
    }

    #[test]
    fn test_bad_signature_maps_to_signature_invalid() {
        let err = jsonwebtoken::errors::Error::from(ErrorKind::InvalidSignature);
        assert!(matches!(
            map_validation_error(&err),
            CartgateError::SignatureInvalid
        ));
    }

    #[test]
    fn test_undecodable_token_maps_to_invalid_token() {
        let err = jsonwebtoken::errors::Error::from(ErrorKind::InvalidToken);
        assert!(matches!(
            map_validation_error(&err),
            CartgateError::InvalidToken(_)
        ));
    }
}

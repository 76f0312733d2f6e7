//! Identity-claim extraction for gateway-verified requests.
//!
//! Token verification is owned by the fronting gateway; this service only
//! reads the claims payload the gateway already validated. Handlers depend
//! on the narrow [`AuthContext`] view rather than the claim-nesting shape.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::UploadError;

/// Claims payload decoded from a gateway-verified access token.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedClaims {
    /// Subject — the identity-provider user identifier.
    #[serde(default)]
    pub sub: Option<String>,
}

/// Narrow view over whatever claim shape the hosting platform supplies.
pub trait AuthContext {
    /// Returns the verified subject identifier, if any.
    fn subject_id(&self) -> Option<&str>;
}

impl AuthContext for VerifiedClaims {
    fn subject_id(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.is_empty())
    }
}

impl VerifiedClaims {
    /// Decodes the claims segment of a JWT without verifying the signature.
    pub fn from_bearer_token(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Authenticated subject extracted from the request. Rejects with an
/// authorization error when the request carries no usable identity claim.
#[derive(Debug, Clone)]
pub struct Subject(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Subject
where
    S: Send + Sync,
{
    type Rejection = UploadError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(UploadError::MissingIdentity)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(UploadError::MissingIdentity)?;

        let claims =
            VerifiedClaims::from_bearer_token(token).ok_or(UploadError::MissingIdentity)?;

        let subject = claims
            .subject_id()
            .ok_or(UploadError::MissingIdentity)?
            .to_string();

        Ok(Subject(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &[u8]) -> String {
        // "e30" is the base64url encoding of "{}"
        format!("e30.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_subject_extracted_from_claims() {
        let token = token_with_payload(br#"{"sub":"user-1"}"#);
        let claims = VerifiedClaims::from_bearer_token(&token).unwrap();
        assert_eq!(claims.subject_id(), Some("user-1"));
    }

    #[test]
    fn test_extra_claims_are_ignored() {
        let token = token_with_payload(br#"{"sub":"u1","iss":"idp","exp":4102444800}"#);
        let claims = VerifiedClaims::from_bearer_token(&token).unwrap();
        assert_eq!(claims.subject_id(), Some("u1"));
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let token = token_with_payload(br#"{"sub":""}"#);
        let claims = VerifiedClaims::from_bearer_token(&token).unwrap();
        assert_eq!(claims.subject_id(), None);
    }

    #[test]
    fn test_missing_subject_claim() {
        let token = token_with_payload(br#"{"iss":"idp"}"#);
        let claims = VerifiedClaims::from_bearer_token(&token).unwrap();
        assert_eq!(claims.subject_id(), None);
    }

    #[test]
    fn test_garbage_token_yields_no_claims() {
        assert!(VerifiedClaims::from_bearer_token("not-a-jwt").is_none());
        assert!(VerifiedClaims::from_bearer_token("a.!!!.c").is_none());
    }
}

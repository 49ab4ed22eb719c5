//! Token issuance and verification (HS256 JWT).

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use hrspace_core::{AuthFailure, DomainError};

use crate::claims::{AccessClaims, ConfirmationClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            other => TokenError::Invalid(other.to_string()),
        }
    }
}

impl From<TokenError> for DomainError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Expired => DomainError::Unauthenticated(AuthFailure::Expired),
            TokenError::Invalid(_) => DomainError::Unauthenticated(AuthFailure::Invalid),
            TokenError::Signing(msg) => DomainError::dependency(msg),
        }
    }
}

/// Token capability consumed by the lifecycle and session layers.
pub trait TokenCodec: Send + Sync {
    fn sign_access(&self, claims: &AccessClaims) -> Result<String, TokenError>;

    /// Verify signature, then the claims' time window against `now`.
    fn verify_access(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError>;

    /// Signed confirmation code carrying the email; no expiry.
    fn sign_confirmation(&self, email: &str) -> Result<String, TokenError>;

    /// Recover the email from a confirmation code without checking the signature.
    ///
    /// Only used to look up the pending credential; the code itself is then
    /// compared against the stored one.
    fn decode_confirmation(&self, token: &str) -> Result<ConfirmationClaims, TokenError>;
}

/// `jsonwebtoken`-backed codec with separate keys for access and confirmation tokens.
#[derive(Clone)]
pub struct JwtCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    confirmation_encoding: EncodingKey,
}

impl JwtCodec {
    pub fn new(access_secret: &[u8], confirmation_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            confirmation_encoding: EncodingKey::from_secret(confirmation_secret),
        }
    }
}

impl core::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtCodec").finish_non_exhaustive()
    }
}

impl TokenCodec for JwtCodec {
    fn sign_access(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.access_encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify_access(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        // Time window is checked by `validate_claims` so tests can pin `now`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<AccessClaims>(token, &self.access_decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }

    fn sign_confirmation(&self, email: &str) -> Result<String, TokenError> {
        let claims = ConfirmationClaims {
            email: email.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.confirmation_encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn decode_confirmation(&self, token: &str) -> Result<ConfirmationClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<ConfirmationClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

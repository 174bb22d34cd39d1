//! JWT token generation and validation.
//!
//! Token issuance normally belongs to the login service; minting is kept here
//! for the seeder and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::Claims;
use crate::config::JwtConfig;
use crate::types::UserId;

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    access_token_expiry_secs: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            access_token_expiry_secs: config.access_token_expiry_secs,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Generates an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(&self, user_id: UserId) -> Result<String, JwtError> {
        let ttl = i64::try_from(self.access_token_expiry_secs).unwrap_or(i64::MAX);
        let expires_at = Utc::now() + Duration::seconds(ttl);
        let claims = Claims::new(user_id, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed or badly signed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_secs: 900,
        })
    }

    #[test]
    fn test_generate_and_validate() {
        let service = create_test_service("test-secret-key-for-testing");
        let user_id = UserId::new();

        let token = service.generate_access_token(user_id).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service("test-secret-key-for-testing");
        assert!(matches!(
            service.validate_token("invalid.token.here"),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = create_test_service("one-secret");
        let verifier = create_test_service("another-secret");
        let token = issuer.generate_access_token(UserId::new()).unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = create_test_service("test-secret-key-for-testing");
        let claims = Claims::new(UserId::new(), Utc::now() - Duration::hours(1));
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::Expired)
        ));
    }
}

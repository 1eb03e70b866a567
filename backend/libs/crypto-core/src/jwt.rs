//! Bearer token issuing and validation for Quill services
//!
//! Tokens are HS256-signed JWTs whose `sub` claim is the user id. Keys are
//! held by an explicitly constructed [`JwtKeys`] value that the service builds
//! from its configuration at startup and hands to whoever needs it.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_core::jwt::JwtKeys;
//! use uuid::Uuid;
//!
//! let keys = JwtKeys::from_secret(b"a-very-long-development-secret-value!", 30).unwrap();
//! let user_id = Uuid::new_v4();
//! let token = keys.issue(user_id).unwrap();
//! assert_eq!(keys.user_id(&token).unwrap(), user_id);
//! ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default lifetime of an issued token.
pub const DEFAULT_TOKEN_EXPIRY_DAYS: i64 = 30;

/// Shortest secret accepted in production deployments.
pub const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims carried by Quill bearer tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("token expiry must be positive, got {0} days")]
    InvalidExpiry(i64),

    #[error("token expired")]
    Expired,

    #[error("token validation failed: {0}")]
    Invalid(String),

    #[error("invalid user id in token subject: {0}")]
    MalformedSubject(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Signing and verification keys plus the token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"[REDACTED]")
            .field("expiry_days", &self.expiry.num_days())
            .finish()
    }
}

impl JwtKeys {
    /// Build keys from a shared secret.
    pub fn from_secret(secret: &[u8], expiry_days: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if expiry_days <= 0 {
            return Err(TokenError::InvalidExpiry(expiry_days));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry: Duration::days(expiry_days),
        })
    }

    /// Issue a token for `user_id` valid from now.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if it had been signed at `issued_at`.
    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.expiry).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    /// Verify a token and extract the user id it was issued for.
    pub fn user_id(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims = self.validate(token)?;
        Uuid::parse_str(&claims.sub).map_err(|e| TokenError::MalformedSubject(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"quill-test-secret-quill-test-secret";

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(TEST_SECRET, DEFAULT_TOKEN_EXPIRY_DAYS).expect("test keys")
    }

    #[test]
    fn test_issue_and_validate() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("issue token");

        assert_eq!(token.matches('.').count(), 2);

        let claims = keys.validate(&token).expect("valid token");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_extract_user_id() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();
        assert_eq!(keys.user_id(&token).unwrap(), user_id);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys();
        let issued_at = Utc::now() - Duration::days(31);
        let token = keys.issue_at(Uuid::new_v4(), issued_at).unwrap();

        assert!(matches!(keys.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = JwtKeys::from_secret(b"some-other-secret-some-other-secret", 30).unwrap();
        let token = other.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(keys().validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            keys().validate("invalid.token.here"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            JwtKeys::from_secret(b"", 30),
            Err(TokenError::EmptySecret)
        ));
        assert!(matches!(
            JwtKeys::from_secret(TEST_SECRET, 0),
            Err(TokenError::InvalidExpiry(0))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", keys());
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("expiry_days: 30"));
    }
}

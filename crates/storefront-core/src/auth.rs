//! Password hashing and JWT issuance.
//!
//! Passwords are stored as argon2id PHC strings. Login issues an HS256
//! access/refresh token pair; protected routes accept only access tokens.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token is expired")]
    ExpiredToken,
    #[error("token is invalid")]
    InvalidToken,
    #[error("token generation failed: {0}")]
    Generation(String),
}

/// Claims carried in both access and refresh tokens.
///
/// `sub` is the user id rendered as a string, per JWT convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub is_admin: bool,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Parse the subject back into a user id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if `sub` is not an integer.
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Hash a plaintext password into an argon2id PHC string.
///
/// # Errors
///
/// Returns [`AuthError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC string.
///
/// A malformed stored hash is treated as a non-match rather than an error;
/// the caller only needs the yes/no answer.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Issue an access/refresh token pair for a user.
///
/// # Errors
///
/// Returns [`AuthError::Generation`] if signing fails.
pub fn issue_token_pair(
    secret: &str,
    user_id: i64,
    username: &str,
    is_admin: bool,
    access_ttl_minutes: i64,
    refresh_ttl_minutes: i64,
) -> Result<TokenPair, AuthError> {
    let access = issue_token(
        secret,
        user_id,
        username,
        is_admin,
        TOKEN_TYPE_ACCESS,
        access_ttl_minutes,
    )?;
    let refresh = issue_token(
        secret,
        user_id,
        username,
        is_admin,
        TOKEN_TYPE_REFRESH,
        refresh_ttl_minutes,
    )?;
    Ok(TokenPair { access, refresh })
}

fn issue_token(
    secret: &str,
    user_id: i64,
    username: &str,
    is_admin: bool,
    token_type: &str,
    ttl_minutes: i64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        is_admin,
        token_type: token_type.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Generation(e.to_string()))
}

/// Decode and validate a bearer token, requiring the `access` token type.
///
/// # Errors
///
/// Returns [`AuthError::ExpiredToken`] for expired tokens and
/// [`AuthError::InvalidToken`] for anything else that fails validation,
/// including refresh tokens presented where an access token is required.
pub fn decode_access_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })?;

    if data.claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(AuthError::InvalidToken);
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-at-least-32-chars!!";

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("hunter2!").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("hunter3!", &hash));
    }

    #[test]
    fn malformed_stored_hash_is_a_non_match() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_pair_round_trips_claims() {
        let pair = issue_token_pair(SECRET, 42, "ada", true, 60, 10080).expect("issue");
        let claims = decode_access_token(SECRET, &pair.access).expect("decode");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username, "ada");
        assert!(claims.is_admin);
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
    }

    #[test]
    fn refresh_token_is_rejected_on_access_paths() {
        let pair = issue_token_pair(SECRET, 7, "bob", false, 60, 10080).expect("issue");
        let err = decode_access_token(SECRET, &pair.refresh).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let pair = issue_token_pair(SECRET, 7, "bob", false, 60, 10080).expect("issue");
        let err =
            decode_access_token("another-secret-also-32-chars-long!!!", &pair.access).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // Negative TTL produces an exp in the past.
        let token = issue_token(SECRET, 7, "bob", false, TOKEN_TYPE_ACCESS, -5).expect("issue");
        let err = decode_access_token(SECRET, &token).unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }
}

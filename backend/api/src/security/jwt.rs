//! JWT token generation and validation using HS256.
//! Tokens carry the user's id, email, role and tier code and expire after 7 days.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};

const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email address
    pub email: String,
    /// Account role: user, artist or admin
    pub role: String,
    /// Denormalized subscription tier at sign-in time
    pub tier_code: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_days: i64,
}

// Thread-safe storage for the signing secret loaded at startup
lazy_static! {
    static ref JWT_KEYS: RwLock<Option<JwtKeys>> = RwLock::new(None);
}

/// Install the signing secret. Must run during startup before any JWT operation.
pub fn initialize_secret(secret: &str, ttl_days: i64) -> Result<()> {
    if secret.len() < 16 {
        return Err(AppError::Internal(
            "JWT secret must be at least 16 characters".to_string(),
        ));
    }

    let mut keys = JWT_KEYS
        .write()
        .map_err(|e| AppError::Internal(format!("Failed to acquire write lock on JWT keys: {}", e)))?;
    *keys = Some(JwtKeys {
        encoding: EncodingKey::from_secret(secret.as_bytes()),
        decoding: DecodingKey::from_secret(secret.as_bytes()),
        ttl_days: if ttl_days > 0 { ttl_days } else { DEFAULT_TOKEN_TTL_DAYS },
    });

    Ok(())
}

fn with_keys<T>(f: impl FnOnce(&JwtKeys) -> Result<T>) -> Result<T> {
    let keys = JWT_KEYS
        .read()
        .map_err(|e| AppError::Internal(format!("Failed to acquire read lock on JWT keys: {}", e)))?;

    match keys.as_ref() {
        Some(keys) => f(keys),
        None => Err(AppError::Internal(
            "JWT secret not initialized. Call initialize_secret() during startup".to_string(),
        )),
    }
}

/// Sign a token for the given account.
pub fn generate_token(user_id: Uuid, email: &str, role: &str, tier_code: &str) -> Result<String> {
    with_keys(|keys| {
        let now = Utc::now();
        let expiry = now + Duration::days(keys.ttl_days);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            tier_code: tier_code.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    })
}

/// Validate a token and return its decoded claims.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    with_keys(|keys| {
        Ok(decode::<Claims>(
            token,
            &keys.decoding,
            &Validation::new(Algorithm::HS256),
        )?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        initialize_secret("test-secret-at-least-16-chars", 7).unwrap();
    }

    #[test]
    fn token_round_trip() {
        init();
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "a@b.c", "user", "free").unwrap();
        let data = validate_token(&token).unwrap();

        assert_eq!(data.claims.sub, user_id.to_string());
        assert_eq!(data.claims.email, "a@b.c");
        assert_eq!(data.claims.role, "user");
        assert_eq!(data.claims.tier_code, "free");
    }

    #[test]
    fn token_expires_in_seven_days() {
        init();
        let token = generate_token(Uuid::new_v4(), "a@b.c", "admin", "pro").unwrap();
        let claims = validate_token(&token).unwrap().claims;
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 7 * 24 * 3600);
    }

    #[test]
    fn garbage_token_is_rejected() {
        init();
        let err = validate_token("not-a-token").unwrap_err();
        assert!(matches!(err, AppError::Token(_)));
    }

    #[test]
    fn signing_errors_propagate_through_handler_results() {
        fn issue(user_id: Uuid) -> Result<String> {
            let token = generate_token(user_id, "a@b.c", "user", "free")?;
            Ok(token)
        }

        init();
        assert!(issue(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn tampered_token_is_rejected() {
        init();
        let token = generate_token(Uuid::new_v4(), "a@b.c", "user", "free").unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(validate_token(&tampered).is_err());
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(initialize_secret("short", 7).is_err());
    }
}

//! JWT token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key shared with the auth collaborator that signs tokens
    pub secret: String,
    /// Issuer claim
    pub issuer: String,
    /// Token expiration in hours (only used when minting test tokens)
    pub expiration_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "super-secret-key-change-in-production".to_string()),
            issuer: "voltdine".to_string(),
            expiration_hours: 24,
        }
    }
}

/// Claims carried by a bearer token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// User role (driver, restaurant, admin)
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    pub fn new(user_id: i64, role: &str, config: &JwtConfig) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: (now + Duration::hours(config.expiration_hours)).timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }
}

/// Mint a token. The production issuer is the auth collaborator; this
/// exists for operational tooling and tests.
pub fn create_token(
    user_id: i64,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(user_id, role, config);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify a token and return its claims.
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);

    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            issuer: "voltdine".to_string(),
            expiration_hours: 1,
        }
    }

    #[test]
    fn token_roundtrip() {
        let cfg = config();
        let token = create_token(42, "driver", &cfg).unwrap();
        let claims = verify_token(&token, &cfg).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "driver");
        assert_eq!(claims.iss, "voltdine");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cfg = config();
        let token = create_token(42, "driver", &cfg).unwrap();

        let other = JwtConfig {
            secret: "different".to_string(),
            ..config()
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let cfg = config();
        let token = create_token(42, "driver", &cfg).unwrap();

        let other = JwtConfig {
            issuer: "someone-else".to_string(),
            ..config()
        };
        assert!(verify_token(&token, &other).is_err());
    }
}

//! Manage json web tokens.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind, get_current_timestamp,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::user::Role;

/// Default token lifetime: 7 days.
/// Long-lived sessions instead of refresh-token plumbing.
pub const DEFAULT_TTL_MINUTES: u64 = 10_080;

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User email.
    pub sub: String,
    /// Custom claim. Granted role of the subject.
    pub role: Role,
}

/// Manage JWT tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    name: String,
    ttl_minutes: u64,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance signing with a process-wide
    /// symmetric secret.
    pub fn new(name: &str, secret: &str, ttl_minutes: Option<u64>) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            name: name.to_owned(),
            ttl_minutes: ttl_minutes.unwrap_or(DEFAULT_TTL_MINUTES),
        }
    }

    /// Create a new [`jsonwebtoken`] asserting `email` and `role`.
    ///
    /// `ttl_minutes` overrides the configured lifetime per issuance.
    pub fn create(
        &self,
        email: &str,
        role: Role,
        ttl_minutes: Option<u64>,
    ) -> Result<String> {
        let time = get_current_timestamp();
        let ttl = ttl_minutes.unwrap_or(self.ttl_minutes);
        let header = Header::new(self.algorithm);
        let claims = Claims {
            exp: time + ttl * 60,
            iat: time,
            iss: self.name.clone(),
            sub: email.to_owned(),
            role,
        };

        encode(&header, &claims, &self.encoding_key).map_err(|err| {
            ServerError::Internal {
                details: "cannot sign token".to_owned(),
                source: Some(Box::new(err)),
            }
        })
    }

    /// Decode and check a token.
    ///
    /// Expired tokens and bad signatures fail differently so callers can
    /// prompt a re-login rather than rejecting outright.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(ServerError::ExpiredToken),
                _ => Err(ServerError::Unauthorized),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-which-should-stay-private";

    fn manager() -> TokenManager {
        TokenManager::new("didactic", SECRET, None)
    }

    #[test]
    fn test_round_trip() {
        let mgr = manager();

        let token = mgr.create("student@example.com", Role::Student, None).unwrap();
        let claims = mgr.decode(&token).unwrap();

        assert_eq!(claims.sub, "student@example.com");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.iss, "didactic");
        assert_eq!(claims.exp, claims.iat + DEFAULT_TTL_MINUTES * 60);
    }

    #[test]
    fn test_ttl_override() {
        let mgr = manager();

        let token = mgr.create("a@b.c", Role::Teacher, Some(5)).unwrap();
        let claims = mgr.decode(&token).unwrap();
        assert_eq!(claims.exp, claims.iat + 5 * 60);
    }

    #[test]
    fn test_expired_token() {
        let mgr = manager();

        let time = get_current_timestamp();
        let claims = Claims {
            exp: time - 120,
            iat: time - 240,
            iss: "didactic".to_owned(),
            sub: "a@b.c".to_owned(),
            role: Role::Student,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            mgr.decode(&token),
            Err(ServerError::ExpiredToken)
        ));
    }

    #[test]
    fn test_bad_signature() {
        let mgr = manager();
        let other = TokenManager::new("didactic", "another-secret", None);

        let token = other.create("a@b.c", Role::Student, None).unwrap();
        assert!(matches!(
            mgr.decode(&token),
            Err(ServerError::Unauthorized)
        ));

        assert!(matches!(
            mgr.decode("definitely.not.a-token"),
            Err(ServerError::Unauthorized)
        ));
    }
}

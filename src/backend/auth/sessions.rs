/**
 * Session Management and JWT Tokens
 *
 * Bearer tokens are HS256 JWTs carrying the principal's id and verified
 * email. Verifying a token is the only identity check the collaborative core
 * performs; everything downstream works with the resulting [`Principal`].
 */

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::config::AppConfig;
use crate::shared::principal::Principal;

/// Secret used when `JWT_SECRET` is not configured
const DEV_SECRET: &str = "notecollab-dev-secret-change-in-production";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Verified email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Errors from token handling
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid user ID in token: {0}")]
    InvalidSubject(#[from] uuid::Error),
    #[error("System clock before Unix epoch")]
    Clock,
}

/// Signing secret plus token lifetime
#[derive(Clone)]
pub struct SessionKeys {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Keys from configuration, falling back to the development secret
    pub fn from_config(config: &AppConfig) -> Self {
        let secret = match &config.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!("[Auth] JWT_SECRET not set, using the development secret");
                DEV_SECRET.to_string()
            }
        };
        Self::new(secret, config.token_ttl())
    }

    /// Create a JWT token for a principal
    pub fn create_token(&self, principal: &Principal) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::Clock)?
            .as_secs();

        let claims = Claims {
            sub: principal.user_id.to_string(),
            email: principal.email.clone(),
            exp: now + self.ttl.as_secs(),
            iat: now,
        };

        let key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }

    /// Verify and decode a JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &key, &Validation::default())?;
        Ok(token_data.claims)
    }

    /// Verify a token and return the principal it attests
    pub fn principal_from_token(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)?;
        Ok(Principal::new(user_id, claims.email))
    }
}

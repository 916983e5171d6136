//! Access token issuing and verification.
//!
//! # Design Decisions
//! - HS256 with a single process-wide secret
//! - Verification checks signature, expiry, issuer and token type
//! - No key is constructed when the secret is absent; callers fail closed

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

const ACCESS: &str = "access";

/// Decoded credential payload, attached to a request as its auth context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("unexpected token type `{0}`")]
    WrongType(String),
}

/// Signing and verification keys derived from the server secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_secs: i64,
}

impl TokenKeys {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_secs: u64) -> Self {
        let issuer = issuer.into();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Returns `None` when no secret is configured.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        config
            .secret()
            .map(|secret| Self::new(secret, config.issuer.clone(), config.token_ttl_secs))
    }

    pub fn issue(&self, user_id: &str) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: user_id.to_string(),
            token_type: ACCESS.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        if data.claims.token_type != ACCESS {
            return Err(TokenError::WrongType(data.claims.token_type));
        }
        Ok(data.claims)
    }
}

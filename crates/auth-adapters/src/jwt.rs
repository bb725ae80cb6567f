//! HS256 bearer tokens whose subject is the member's email.

use chrono::{Duration, Utc};
use domains::{Identity, IdentityGate};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Claims carried by a petboard access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // member email
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is empty")]
    EmptySubject,
}

#[derive(Clone)]
pub struct JwtIdentityGate {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtIdentityGate {
    pub fn new(secret: &SecretString, issuer: impl Into<String>) -> Self {
        let raw = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(raw),
            decoding_key: DecodingKey::from_secret(raw),
            issuer: issuer.into(),
        }
    }

    /// Signs a token for `email`. Issuance is owned by the membership
    /// subsystem; this exists so tools and tests can mint compatible tokens.
    pub fn issue(&self, email: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;
        if claims.sub.trim().is_empty() {
            return Err(TokenError::EmptySubject);
        }
        Ok(claims)
    }
}

impl IdentityGate for JwtIdentityGate {
    fn resolve(&self, bearer: &str) -> Option<Identity> {
        match self.verify(bearer) {
            Ok(claims) => Some(Identity::new(claims.sub)),
            Err(e) => {
                debug!(error = %e, "bearer token not accepted");
                None
            }
        }
    }
}

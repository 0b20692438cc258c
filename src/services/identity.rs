use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthSettings;

/// Errors that can occur while identifying the caller
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Marketplace role carried in the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Childminder,
    Admin,
}

/// Claims issued by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Auth provider user id
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// Verifies session tokens issued by the external auth provider
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = settings.leeway_secs.unwrap_or(60);

        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &settings.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify a raw token and return its claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims, IdentityError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }

    /// Verify the value of an `Authorization: Bearer <token>` header
    pub fn verify_header(&self, header: Option<&str>) -> Result<SessionClaims, IdentityError> {
        let header = header.ok_or(IdentityError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(IdentityError::MalformedHeader)?;

        self.verify(token)
    }
}

//! JWT utilities for claim signing and signature verification
//!
//! Builds the claim set for an account and signs it with HS256. Tokens live
//! for a fixed 10 hours. Expiry is not checked here; the validator checks it
//! after the signature.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::core::config::TokenSecrets;
use crate::core::db::models::{Account, Role};

/// Token lifetime (10 hours)
pub const TOKEN_LIFETIME_HOURS: i64 = 10;

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Malformed(err.to_string()),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Role at issuance time
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims for an account issued at `now`
    pub fn for_account(account: &Account, now: DateTime<Utc>) -> Self {
        let exp = now + Duration::hours(TOKEN_LIFETIME_HOURS);

        Self {
            sub: account.username.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    /// Whether the token has expired at `now` (no leeway)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Compact three-segment signed token (header.claims.signature)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken(String);

impl SignedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// JWT service for signing and verifying claims
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Create a new JWT service from the process-wide secrets
    pub fn new(secrets: &TokenSecrets) -> Self {
        let key = secrets.signing_key().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            validation,
        }
    }

    /// Sign a fresh claim set for the account, issued now
    pub fn sign(&self, account: &Account) -> Result<SignedToken, JwtError> {
        self.sign_at(account, Utc::now())
    }

    /// Sign a claim set for the account issued at the given instant
    pub fn sign_at(&self, account: &Account, now: DateTime<Utc>) -> Result<SignedToken, JwtError> {
        self.sign_claims(&Claims::for_account(account, now))
    }

    /// Sign an already-built claim set
    pub fn sign_claims(&self, claims: &Claims) -> Result<SignedToken, JwtError> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(SignedToken(token))
    }

    /// Verify the signature and decode the claims. Does not check expiry.
    pub fn verify(&self, token: &SignedToken) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token.as_str(), &self.decoding_key, &self.validation)?;

        Ok(token_data.claims)
    }
}

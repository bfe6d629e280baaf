//! Opaque token validation
//!
//! Turns an opaque token into a [`Principal`]. The checks run in a fixed
//! order and stop at the first failure:
//!
//! 1. decrypt ([`TokenError::DecryptionFailure`])
//! 2. verify signature and parse claims ([`TokenError::SignatureInvalid`])
//! 3. expiry, `now >= exp` ([`TokenError::Expired`])
//! 4. subject against the expected username, if one is given
//!    ([`TokenError::PrincipalMismatch`])
//!
//! The role is read from the token as issued. The credential store is not
//! consulted, so a role change only reaches clients once their token expires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::auth::encryptor::{EncryptorError, TokenEncryptor};
use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::db::models::Role;

/// Token validation failures
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token decryption failed: {0}")]
    DecryptionFailure(#[source] EncryptorError),

    #[error("Token signature invalid: {0}")]
    SignatureInvalid(#[source] JwtError),

    #[error("Token expired")]
    Expired,

    #[error("Token subject does not match the caller")]
    PrincipalMismatch,
}

impl TokenError {
    /// Short stable name of the failure, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::DecryptionFailure(_) => "decryption_failure",
            TokenError::SignatureInvalid(_) => "signature_invalid",
            TokenError::Expired => "expired",
            TokenError::PrincipalMismatch => "principal_mismatch",
        }
    }
}

/// Authenticated identity derived from a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Validates opaque tokens against the current keys
#[derive(Clone)]
pub struct TokenValidator {
    jwt: JwtService,
    encryptor: TokenEncryptor,
}

impl TokenValidator {
    pub fn new(jwt: JwtService, encryptor: TokenEncryptor) -> Self {
        Self { jwt, encryptor }
    }

    /// Validate a token at the current time
    pub fn validate(
        &self,
        opaque: &str,
        expected_username: Option<&str>,
    ) -> Result<Principal, TokenError> {
        self.validate_at(opaque, expected_username, Utc::now())
    }

    /// Validate a token as of `now`
    pub fn validate_at(
        &self,
        opaque: &str,
        expected_username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Principal, TokenError> {
        let signed = self
            .encryptor
            .unwrap(opaque)
            .map_err(TokenError::DecryptionFailure)?;

        let claims = self
            .jwt
            .verify(&signed)
            .map_err(TokenError::SignatureInvalid)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        if let Some(expected) = expected_username
            && expected != claims.sub
        {
            return Err(TokenError::PrincipalMismatch);
        }

        Ok(Principal {
            username: claims.sub,
            role: claims.role,
        })
    }
}

//! Authentication service
//!
//! Provides the register and login flows and the per-request `authenticate`
//! check. Coordinates the credential store, the password hasher, the JWT
//! signer and the token encryptor. Holds no per-token state.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::core::auth::encryptor::{EncryptorError, TokenEncryptor};
use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::auth::password::{HashError, PasswordHasher};
use crate::core::auth::validator::{Principal, TokenError, TokenValidator};
use crate::core::config::TokenSecrets;
use crate::core::db::models::{Account, AccountResponse, NewAccount, Role};
use crate::core::db::repositories::{CredentialStore, StoreError};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Token could not be decrypted")]
    TokenDecryptionFailure,

    #[error("Token signature invalid")]
    TokenSignatureInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token does not belong to the caller")]
    PrincipalMismatch,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameAlreadyExists => AuthError::DuplicateUsername,
            StoreError::EmailAlreadyExists => AuthError::DuplicateEmail,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::DecryptionFailure(_) => AuthError::TokenDecryptionFailure,
            TokenError::SignatureInvalid(_) => AuthError::TokenSignatureInvalid,
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::PrincipalMismatch => AuthError::PrincipalMismatch,
        }
    }
}

// Issuance-side failures; validation goes through TokenError.
impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<EncryptorError> for AuthError {
    fn from(err: EncryptorError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Registration request data
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Requested role; only a case-insensitive "ADMIN" is honored
    #[serde(default)]
    pub role: Option<String>,
}

/// Login request data
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authentication response: a freshly issued token plus the account's public fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(flatten)]
    pub account: AccountResponse,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: JwtService,
    encryptor: TokenEncryptor,
    validator: TokenValidator,
    /// Hash verified against when the username is unknown
    dummy_hash: Arc<OnceLock<Option<String>>>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        secrets: &TokenSecrets,
    ) -> Self {
        let jwt = JwtService::new(secrets);
        let encryptor = TokenEncryptor::new(secrets);
        let validator = TokenValidator::new(jwt.clone(), encryptor.clone());

        Self {
            store,
            hasher,
            jwt,
            encryptor,
            validator,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    fn require_present(field: &str, value: &str) -> Result<(), AuthError> {
        if value.trim().is_empty() {
            return Err(AuthError::InvalidRequest(format!("{} is required", field)));
        }
        Ok(())
    }

    /// Spend one verify on an unknown username so its timing matches a wrong password
    fn verify_dummy(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_init(|| self.hasher.hash("unknown-account-placeholder").ok());

        if let Some(hash) = dummy {
            let _ = self.hasher.verify(password, hash);
        }
    }

    /// Sign and encrypt a new token for the account
    fn issue_token(&self, account: &Account) -> Result<String, AuthError> {
        let signed = self.jwt.sign(account)?;
        Ok(self.encryptor.wrap(&signed)?)
    }

    /// Register a new account and issue its first token
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        Self::require_present("Username", &request.username)?;
        Self::require_present("Password", &request.password)?;

        if self.store.find_by_username(&request.username).await?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let role = Role::from_hint(request.role.as_deref());
        let email = request.email.filter(|e| !e.trim().is_empty());

        // The store's uniqueness constraint still decides concurrent races
        let account = self
            .store
            .save(NewAccount {
                username: request.username,
                password_hash,
                role,
                email,
            })
            .await?;

        let token = self.issue_token(&account)?;

        Ok(AuthResponse {
            token,
            account: account.into(),
        })
    }

    /// Verify credentials and issue a new token
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        Self::require_present("Username", &request.username)?;
        Self::require_present("Password", &request.password)?;

        let Some(account) = self.store.find_by_username(&request.username).await? else {
            self.verify_dummy(&request.password);
            return Err(AuthError::UserNotFound);
        };

        let is_valid = match self.hasher.verify(&request.password, &account.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("Stored hash for {} could not be checked: {}", account.username, e);
                false
            }
        };

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&account)?;

        Ok(AuthResponse {
            token,
            account: account.into(),
        })
    }

    /// Validate an opaque token, optionally binding it to the caller's username
    pub fn authenticate(
        &self,
        token: &str,
        caller_username: Option<&str>,
    ) -> Result<Principal, AuthError> {
        self.validator
            .validate(token, caller_username)
            .map_err(|e| {
                tracing::debug!(kind = e.kind(), "Token rejected: {}", e);
                AuthError::from(e)
            })
    }

    /// Require the principal to hold the admin role
    pub fn require_admin(principal: &Principal) -> Result<(), AuthError> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole)
        }
    }
}

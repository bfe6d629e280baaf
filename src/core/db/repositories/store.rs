//! Credential store contract
//!
//! The orchestrator only needs two things from persistence: look an account
//! up by username, and save a new one while enforcing uniqueness.

use async_trait::async_trait;

use crate::core::db::models::{Account, NewAccount};

/// Credential store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Lookup and persistence of accounts
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account by its exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Persist a new account and return it with its assigned id.
    ///
    /// Fails with `UsernameAlreadyExists` / `EmailAlreadyExists` when the
    /// uniqueness constraint is violated.
    async fn save(&self, account: NewAccount) -> Result<Account, StoreError>;
}

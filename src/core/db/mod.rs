//! Database module for finance-auth
//!
//! This module provides database connectivity, models, and the credential
//! store implementations backed by PostgreSQL (SQLx) or process memory.

pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used items
pub use models::*;
pub use pool::{DbConfig, DbError, create_pool, create_pool_with_migrations};
pub use repositories::{AccountRepository, CredentialStore, InMemoryCredentialStore, StoreError};

// Re-export sqlx types that might be needed
pub use sqlx::PgPool;

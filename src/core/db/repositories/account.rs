//! Account repository for PostgreSQL
//!
//! Implements [`CredentialStore`] over the `users` table. Uniqueness is left
//! to the table constraints so concurrent registrations cannot both win.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::db::models::{Account, NewAccount};
use crate::core::db::repositories::store::{CredentialStore, StoreError};

const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Account repository for database operations
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique violation into the matching store error
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        match db_err.constraint() {
            Some(EMAIL_CONSTRAINT) => return StoreError::EmailAlreadyExists,
            Some(USERNAME_CONSTRAINT) | None => return StoreError::UsernameAlreadyExists,
            Some(_) => {}
        }
    }

    StoreError::DatabaseError(err)
}

#[async_trait]
impl CredentialStore for AccountRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, password_hash, role, email
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn save(&self, account: NewAccount) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (username, password_hash, role, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, role, email
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(account)
    }
}

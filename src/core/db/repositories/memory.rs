//! In-memory credential store
//!
//! Used when no `DATABASE_URL` is configured, and by tests. Accounts live in a
//! `DashMap` keyed by username; ids come from an atomic counter.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::core::db::models::{Account, NewAccount};
use crate::core::db::repositories::store::{CredentialStore, StoreError};

/// Account store backed by process memory
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    accounts: DashMap<String, Account>,
    emails: DashMap<String, ()>,
    next_id: AtomicI64,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(username).map(|entry| entry.value().clone()))
    }

    async fn save(&self, account: NewAccount) -> Result<Account, StoreError> {
        // The username slot stays locked while the email is reserved.
        match self.accounts.entry(account.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::UsernameAlreadyExists),
            Entry::Vacant(slot) => {
                if let Some(email) = &account.email {
                    match self.emails.entry(email.clone()) {
                        Entry::Occupied(_) => return Err(StoreError::EmailAlreadyExists),
                        Entry::Vacant(email_slot) => {
                            email_slot.insert(());
                        }
                    }
                }

                let stored = Account {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    username: account.username,
                    password_hash: account.password_hash,
                    role: account.role,
                    email: account.email,
                };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }
}

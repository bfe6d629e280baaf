//! Database repositories for finance-auth
//!
//! [`CredentialStore`] is the contract the auth orchestrator consumes; it has
//! a PostgreSQL implementation and an in-memory one.

pub mod account;
pub mod memory;
pub mod store;

pub use account::AccountRepository;
pub use memory::InMemoryCredentialStore;
pub use store::{CredentialStore, StoreError};

//! finance-auth - token issuance and validation for a personal-finance backend
//!
//! Accounts register and log in with a username and password and receive an
//! opaque token: HS256-signed claims sealed with password-derived AES-GCM.
//! Protected routes validate the token and act on the resulting principal.

pub mod core;

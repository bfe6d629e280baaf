//! Authentication for the finance backend
//!
//! This module provides:
//! - Signed claims (HS256) wrapped in password-derived encryption
//! - Ordered token validation
//! - Account registration and login
//! - REST API endpoints and request guards

pub mod api;
pub mod encryptor;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod service;
pub mod validator;

pub use api::{AuthApiState, auth_api_router};
pub use encryptor::{EncryptorError, TokenEncryptor};
pub use guard::{require_admin, require_auth};
pub use jwt::{Claims, JwtError, JwtService, SignedToken};
pub use password::{BcryptHasher, HashError, PasswordHasher};
pub use service::{AuthError, AuthResponse, AuthService, LoginRequest, RegisterRequest};
pub use validator::{Principal, TokenError, TokenValidator};

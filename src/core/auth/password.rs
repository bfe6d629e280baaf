//! Password hashing
//!
//! One-way hash and verify for stored credentials, using bcrypt.

/// Password hashing error types
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash and verify passwords
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

/// bcrypt-backed hasher with automatic salt generation
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| HashError::HashingError(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        bcrypt::verify(plaintext, hash).map_err(|e| HashError::MalformedHash(e.to_string()))
    }
}

//! Token encryption
//!
//! Wraps a signed token into the opaque string handed to clients, and back.
//! The key is derived from the encryptor password with PBKDF2-HMAC-SHA512
//! under a fresh random salt on every call, and the payload is sealed with
//! AES-256-GCM under a fresh random nonce.
//!
//! Wire format: `base64(salt[16] || nonce[12] || ciphertext || tag[16])`

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};

use crate::core::auth::jwt::SignedToken;
use crate::core::config::TokenSecrets;

/// PBKDF2 salt size (16 bytes)
const SALT_SIZE: usize = 16;

/// Nonce size for AES-256-GCM (12 bytes / 96 bits)
const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size
const TAG_SIZE: usize = 16;

/// PBKDF2 iteration count
const PBKDF2_ITERATIONS: u32 = 1000;

/// Encryption errors
#[derive(Debug, thiserror::Error)]
pub enum EncryptorError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Token is not valid base64")]
    InvalidEncoding,

    #[error("Token is too short ({0} bytes)")]
    Truncated(usize),

    #[error("Token could not be decrypted")]
    DecryptionFailed,

    #[error("Decrypted token is not valid UTF-8")]
    InvalidUtf8,
}

/// Password-based token encryptor
#[derive(Clone)]
pub struct TokenEncryptor {
    password: SecretString,
}

impl std::fmt::Debug for TokenEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEncryptor").finish_non_exhaustive()
    }
}

impl TokenEncryptor {
    /// Create an encryptor keyed by the process-wide encryptor password
    pub fn new(secrets: &TokenSecrets) -> Self {
        Self {
            password: SecretString::from(secrets.encryptor_password().to_string()),
        }
    }

    /// Derive a 256-bit AES key from the password and salt
    fn derive_key(&self, salt: &[u8]) -> [u8; 32] {
        let mut key = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<sha2::Sha512>(
            self.password.expose_secret().as_bytes(),
            salt,
            PBKDF2_ITERATIONS,
            &mut key,
        );
        key
    }

    /// Encrypt a signed token into an opaque token string
    pub fn wrap(&self, token: &SignedToken) -> Result<String, EncryptorError> {
        let mut salt = [0u8; SALT_SIZE];
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce_bytes);

        let key = self.derive_key(&salt);
        let cipher =
            Aes256Gcm::new_from_slice(&key).map_err(|_| EncryptorError::EncryptionFailed)?;

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), token.as_str().as_bytes())
            .map_err(|_| EncryptorError::EncryptionFailed)?;

        let mut combined = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&salt);
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(&combined))
    }

    /// Decrypt an opaque token back into the signed token it wraps
    pub fn unwrap(&self, opaque: &str) -> Result<SignedToken, EncryptorError> {
        let combined = STANDARD
            .decode(opaque)
            .map_err(|_| EncryptorError::InvalidEncoding)?;

        if combined.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(EncryptorError::Truncated(combined.len()));
        }

        let (salt, rest) = combined.split_at(SALT_SIZE);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

        let key = self.derive_key(salt);
        let cipher =
            Aes256Gcm::new_from_slice(&key).map_err(|_| EncryptorError::DecryptionFailed)?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| EncryptorError::DecryptionFailed)?;

        let token = String::from_utf8(plaintext).map_err(|_| EncryptorError::InvalidUtf8)?;

        Ok(SignedToken::new(token))
    }
}

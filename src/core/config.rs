//! Application configuration from environment variables.
//!
//! Load configuration using `AppConfig::from_env()` after calling
//! `dotenvy::dotenv()`. Missing or malformed token secrets are reported here so
//! the process refuses to start instead of failing on the first request.

use std::net::SocketAddr;

use secrecy::{ExposeSecret, SecretString};

/// HS256 keys shorter than 256 bits are rejected.
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default bcrypt cost factor
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Configuration errors. Every variant is fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    #[error("JWT_SECRET must be at least {MIN_SIGNING_KEY_BYTES} bytes, got {0}")]
    WeakSigningKey(usize),

    #[error("ENCRYPTOR_PASSWORD must not be empty")]
    EmptyEncryptorPassword,

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// The two process-wide token secrets.
///
/// Built once at startup and shared read-only by the signer and the
/// encryptor. `Debug` output is redacted by `SecretString`.
#[derive(Debug, Clone)]
pub struct TokenSecrets {
    signing_key: SecretString,
    encryptor_password: SecretString,
}

impl TokenSecrets {
    /// Validate and wrap both secrets
    pub fn new(
        signing_key: impl Into<String>,
        encryptor_password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let signing_key = signing_key.into();
        let encryptor_password = encryptor_password.into();

        if signing_key.len() < MIN_SIGNING_KEY_BYTES {
            return Err(ConfigError::WeakSigningKey(signing_key.len()));
        }
        if encryptor_password.is_empty() {
            return Err(ConfigError::EmptyEncryptorPassword);
        }
        if signing_key == encryptor_password {
            tracing::warn!("JWT_SECRET and ENCRYPTOR_PASSWORD are identical; use independent secrets");
        }

        Ok(Self {
            signing_key: SecretString::from(signing_key),
            encryptor_password: SecretString::from(encryptor_password),
        })
    }

    pub fn signing_key(&self) -> &str {
        self.signing_key.expose_secret()
    }

    pub fn encryptor_password(&self) -> &str {
        self.encryptor_password.expose_secret()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection URL. Without it the in-memory store is used.
    pub database_url: Option<String>,

    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// bcrypt cost factor for new password hashes
    pub bcrypt_cost: u32,

    /// Token signing key and encryption password
    pub secrets: TokenSecrets,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing_key = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let encryptor_password =
            lookup("ENCRYPTOR_PASSWORD").ok_or(ConfigError::Missing("ENCRYPTOR_PASSWORD"))?;
        let secrets = TokenSecrets::new(signing_key, encryptor_password)?;

        let bind_addr = match lookup("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value,
            })?,
            None => DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })?,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(value) => match value.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "BCRYPT_COST",
                        value,
                    });
                }
            },
            None => DEFAULT_BCRYPT_COST,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            bind_addr,
            bcrypt_cost,
            secrets,
        })
    }

    /// Check if database is configured
    pub fn has_database(&self) -> bool {
        self.database_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SIGNING_KEY: &str = "0123456789abcdef0123456789abcdef";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ========================================================================
    // TokenSecrets Tests
    // ========================================================================

    #[test]
    fn test_token_secrets_accepts_valid_pair() {
        let secrets = TokenSecrets::new(SIGNING_KEY, "encryptor-pass").unwrap();
        assert_eq!(secrets.signing_key(), SIGNING_KEY);
        assert_eq!(secrets.encryptor_password(), "encryptor-pass");
    }

    #[test]
    fn test_token_secrets_rejects_short_signing_key() {
        let result = TokenSecrets::new("too-short", "encryptor-pass");
        assert!(matches!(result, Err(ConfigError::WeakSigningKey(9))));
    }

    #[test]
    fn test_token_secrets_rejects_empty_password() {
        let result = TokenSecrets::new(SIGNING_KEY, "");
        assert!(matches!(result, Err(ConfigError::EmptyEncryptorPassword)));
    }

    #[test]
    fn test_token_secrets_debug_is_redacted() {
        let secrets = TokenSecrets::new(SIGNING_KEY, "encryptor-pass").unwrap();
        let debug = format!("{:?}", secrets);

        assert!(!debug.contains(SIGNING_KEY));
        assert!(!debug.contains("encryptor-pass"));
    }

    // ========================================================================
    // AppConfig Tests
    // ========================================================================

    #[test]
    fn test_from_lookup_minimal() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SIGNING_KEY),
            ("ENCRYPTOR_PASSWORD", "pw"),
        ]))
        .unwrap();

        assert!(!config.has_database());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.bcrypt_cost, DEFAULT_BCRYPT_COST);
    }

    #[test]
    fn test_from_lookup_all_fields() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SIGNING_KEY),
            ("ENCRYPTOR_PASSWORD", "pw"),
            ("DATABASE_URL", "postgres://localhost/finance"),
            ("BIND_ADDR", "0.0.0.0:9000"),
            ("BCRYPT_COST", "10"),
        ]))
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/finance")
        );
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.bcrypt_cost, 10);
    }

    #[test]
    fn test_from_lookup_empty_database_url_is_none() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SIGNING_KEY),
            ("ENCRYPTOR_PASSWORD", "pw"),
            ("DATABASE_URL", ""),
        ]))
        .unwrap();

        assert!(!config.has_database());
    }

    #[test]
    fn test_from_lookup_missing_secrets_is_fatal() {
        let result = AppConfig::from_lookup(lookup_from(&[("ENCRYPTOR_PASSWORD", "pw")]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));

        let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", SIGNING_KEY)]));
        assert!(matches!(
            result,
            Err(ConfigError::Missing("ENCRYPTOR_PASSWORD"))
        ));
    }

    #[test]
    fn test_from_lookup_invalid_values() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SIGNING_KEY),
            ("ENCRYPTOR_PASSWORD", "pw"),
            ("BIND_ADDR", "not-an-address"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "BIND_ADDR", .. })
        ));

        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SIGNING_KEY),
            ("ENCRYPTOR_PASSWORD", "pw"),
            ("BCRYPT_COST", "99"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "BCRYPT_COST", .. })
        ));
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::Missing("JWT_SECRET").to_string(),
            "JWT_SECRET environment variable is not set"
        );
        assert_eq!(
            ConfigError::WeakSigningKey(5).to_string(),
            "JWT_SECRET must be at least 32 bytes, got 5"
        );
    }
}

//! Database models for finance-auth
//!
//! This module defines the account entity and the role enum shared by the
//! credential store, the token claims and the HTTP API.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Role
// ============================================================================

/// Account role, serialized as `"USER"` / `"ADMIN"` everywhere it appears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

/// Error returned when a stored or transmitted role string is not recognized
#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Resolve a registration hint. Only a case-insensitive `ADMIN` grants
    /// the admin role; anything else, including no hint, yields `User`.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some(h) if h.eq_ignore_ascii_case("ADMIN") => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Account Model
// ============================================================================

/// Account entity representing a registered user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub email: Option<String>,
}

/// Account data for creation (password_hash must already be hashed)
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub email: Option<String>,
}

/// Account without sensitive data (for API responses)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub email: Option<String>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            role: account.role,
            email: account.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_hint_is_case_insensitive() {
        assert_eq!(Role::from_hint(Some("ADMIN")), Role::Admin);
        assert_eq!(Role::from_hint(Some("admin")), Role::Admin);
        assert_eq!(Role::from_hint(Some("aDmIn")), Role::Admin);
    }

    #[test]
    fn test_role_from_hint_defaults_to_user() {
        assert_eq!(Role::from_hint(None), Role::User);
        assert_eq!(Role::from_hint(Some("USER")), Role::User);
        assert_eq!(Role::from_hint(Some("superuser")), Role::User);
        assert_eq!(Role::from_hint(Some("")), Role::User);
        assert_eq!(Role::from_hint(Some("administrator")), Role::User);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""USER""#);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);

        let role: Role = serde_json::from_str(r#""ADMIN""#).unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("admin".parse::<Role>().is_err());
        assert!(Role::try_from("GUEST".to_string()).is_err());
    }

    #[test]
    fn test_account_serialization_hides_password_hash() {
        let account = Account {
            id: 7,
            username: "alice".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            role: Role::User,
            email: Some("a@x.com".to_string()),
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$04$secret"));
        assert!(json.contains(r#""role":"USER""#));
    }

    #[test]
    fn test_account_response_from_account() {
        let account = Account {
            id: 1,
            username: "root".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
            email: None,
        };

        let response: AccountResponse = account.into();
        assert_eq!(response.id, 1);
        assert_eq!(response.username, "root");
        assert_eq!(response.role, Role::Admin);
        assert!(response.email.is_none());
    }
}

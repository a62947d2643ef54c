//! Principal and profile models sourced from the auth and data collaborators.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// The authenticated identity for the current session.
///
/// Owned by the session store and replaced wholesale on every auth state
/// change; absent entirely when unauthenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier assigned by the auth provider.
    pub id: Uuid,
    /// Email address the principal signed up with.
    pub email: String,
    /// When the email address was verified, if it has been.
    pub email_verified_at: Option<Timestamp>,
    /// When the account was created.
    pub created_at: Timestamp,
    /// When the principal last signed in.
    pub last_sign_in_at: Option<Timestamp>,
}

impl Principal {
    /// Returns whether the principal's email address has been verified.
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// Backend-persisted record extending a [`Principal`] with RBAC data.
///
/// Mutated only through the explicit role-update operation; fetched on
/// session establishment and on demand refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Principal this profile belongs to (1:1).
    pub id: Uuid,
    /// Global role; `Unassigned` when no role has been granted yet.
    #[serde(default)]
    pub role: Role,
    /// Timestamp when the profile was created.
    pub created_at: Timestamp,
    /// Timestamp when the profile was last updated.
    pub updated_at: Timestamp,
}

impl Profile {
    /// Returns the global role as an `Option`, `None` when unassigned.
    pub fn global_role(&self) -> Option<Role> {
        self.role.assigned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> Timestamp {
        "2026-01-15T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_missing_role_field_defaults_to_unassigned() {
        let json = format!(
            r#"{{"id":"{}","created_at":"2026-01-15T10:00:00Z","updated_at":"2026-01-15T10:00:00Z"}}"#,
            Uuid::new_v4()
        );
        let profile: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile.role, Role::Unassigned);
        assert_eq!(profile.global_role(), None);
    }

    #[test]
    fn test_email_verification_predicate() {
        let mut principal = Principal {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            email_verified_at: None,
            created_at: timestamp(),
            last_sign_in_at: None,
        };
        assert!(!principal.is_email_verified());
        principal.email_verified_at = Some(timestamp());
        assert!(principal.is_email_verified());
    }
}

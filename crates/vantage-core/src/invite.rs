//! Invite model for pending role offers.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::role::Role;

/// A pending, revocable offer of membership and role sent to an email
/// address.
///
/// Not owned by any session; lives entirely in the backend store and is
/// deleted when accepted or explicitly revoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invite {
    /// Unique invitation identifier.
    pub id: Uuid,
    /// Email address of the invitee.
    pub email: String,
    /// Role to be assigned upon acceptance.
    pub role: Role,
    /// Target organization, if the invite is org-scoped.
    pub org_id: Option<Uuid>,
    /// Timestamp when the invitation was created.
    pub created_at: Timestamp,
}

/// Data for creating a new invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct NewInvite {
    /// Email address of the invitee.
    #[validate(email(message = "invitee email address is not valid"))]
    pub email: String,
    /// Role to be assigned upon acceptance.
    pub role: Role,
    /// Target organization, if the invite is org-scoped.
    pub org_id: Option<Uuid>,
}

impl NewInvite {
    /// Creates a new user invitation scoped to an organization.
    pub fn org_user(email: impl Into<String>, org_id: Uuid) -> Self {
        Self {
            email: email.into(),
            role: Role::User,
            org_id: Some(org_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[test]
    fn test_malformed_email_fails_before_any_network_call() {
        let invite = NewInvite::org_user("not-an-email", Uuid::new_v4());
        assert!(invite.validate().is_err());
    }

    #[test]
    fn test_valid_invite_passes_validation() {
        let invite = NewInvite {
            email: "teammate@example.com".into(),
            role: Role::Admin,
            org_id: None,
        };
        assert!(invite.validate().is_ok());
    }
}

//! Role enumeration for principal classification and access control.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines the role of a principal, either globally (from the profile
/// record) or scoped to one organization (from a membership record).
///
/// The set is closed: backend values outside of it deserialize to
/// [`Role::Unassigned`], which holds no permissions. Treating unknown as
/// unassigned keeps role resolution fail-closed.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Unauthenticated or public access with no account-backed capabilities.
    #[serde(rename = "guest")]
    Guest,

    /// Regular account with a personal dashboard and own-task management.
    #[serde(rename = "user")]
    User,

    /// Administrative access to users and invitations.
    #[serde(rename = "admin")]
    Admin,

    /// Administrative access scoped to a single organization.
    #[serde(rename = "org_admin")]
    OrgAdmin,

    /// Full access to every action, across organizations.
    #[serde(rename = "super_admin")]
    SuperAdmin,

    /// Manages pending invitations only.
    #[serde(rename = "invite_admin")]
    InviteAdmin,

    /// No role assigned yet, or an unrecognized backend value.
    #[default]
    #[serde(rename = "unassigned", other)]
    Unassigned,
}

impl Role {
    /// Returns whether this role is the global "super" role that wins
    /// effective-role precedence regardless of organization context.
    #[inline]
    pub const fn is_super(self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Returns whether this role represents an actual assignment.
    #[inline]
    pub const fn is_assigned(self) -> bool {
        !matches!(self, Role::Unassigned)
    }

    /// Returns `Some(self)` for assigned roles and `None` otherwise.
    ///
    /// Role resolution distinguishes "no role assigned" from "role data
    /// still loading"; this normalizes the former into an `Option` so the
    /// two can never be conflated downstream.
    #[inline]
    pub const fn assigned(self) -> Option<Role> {
        if self.is_assigned() { Some(self) } else { None }
    }
}

/// Reconciles a global role and an active-organization role into the single
/// effective role used for display.
///
/// Precedence: a recognized super global role always wins regardless of org
/// context; otherwise the active organization's role is used if present;
/// otherwise the global role; otherwise `None`.
pub fn effective_role(global: Option<Role>, org: Option<Role>) -> Option<Role> {
    let global = global.and_then(Role::assigned);
    let org = org.and_then(Role::assigned);
    match global {
        Some(role) if role.is_super() => Some(role),
        _ => org.or(global),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_round_trip() {
        assert_eq!(Role::OrgAdmin.to_string(), "org_admin");
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(Role::default(), Role::Unassigned);
    }

    #[test]
    fn test_unknown_backend_value_deserializes_to_unassigned() {
        let role: Role = serde_json::from_str("\"operator\"").unwrap();
        assert_eq!(role, Role::Unassigned);
    }

    #[test]
    fn test_super_global_role_always_wins() {
        assert_eq!(
            effective_role(Some(Role::SuperAdmin), Some(Role::User)),
            Some(Role::SuperAdmin)
        );
        assert_eq!(
            effective_role(Some(Role::SuperAdmin), None),
            Some(Role::SuperAdmin)
        );
    }

    #[test]
    fn test_org_role_beats_non_super_global() {
        assert_eq!(
            effective_role(Some(Role::User), Some(Role::OrgAdmin)),
            Some(Role::OrgAdmin)
        );
        assert_eq!(
            effective_role(Some(Role::Admin), Some(Role::User)),
            Some(Role::User)
        );
    }

    #[test]
    fn test_global_role_is_the_fallback() {
        assert_eq!(effective_role(Some(Role::User), None), Some(Role::User));
        assert_eq!(effective_role(None, None), None);
    }

    #[test]
    fn test_unassigned_never_becomes_effective() {
        assert_eq!(effective_role(Some(Role::Unassigned), None), None);
        assert_eq!(
            effective_role(Some(Role::Unassigned), Some(Role::Unassigned)),
            None
        );
        assert_eq!(
            effective_role(None, Some(Role::Unassigned)),
            None
        );
    }
}

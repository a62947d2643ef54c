//! Immutable view of the authorization state at one point in time.

use jiff::Timestamp;
use uuid::Uuid;
use vantage_core::{Action, OrgMembership, Principal, Profile, Role, effective_role, has_permission};

/// One published state of the authorization engine.
///
/// Snapshots are cheap to clone and answer every decision question purely.
/// All answers fail closed: while `loading` is true, or when no principal
/// is present, every decision method reports denied/unauthenticated.
/// "Role data still loading" is never conflated with "no role assigned".
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    /// Whether role resolution for the current principal is still in flight.
    pub loading: bool,
    /// The authenticated identity, absent when signed out.
    pub principal: Option<Principal>,
    /// When the backing session token stops being honored.
    pub session_expires_at: Option<Timestamp>,
    /// Profile carrying the global role.
    pub profile: Option<Profile>,
    /// Organization memberships, sorted by organization id.
    pub memberships: Vec<OrgMembership>,
    /// The active organization, at most one per session.
    pub current_org: Option<Uuid>,
}

impl Default for AuthSnapshot {
    /// The startup state: loading, with nothing resolved yet.
    fn default() -> Self {
        Self {
            loading: true,
            principal: None,
            session_expires_at: None,
            profile: None,
            memberships: Vec::new(),
            current_org: None,
        }
    }
}

impl AuthSnapshot {
    /// A fully signed-out snapshot.
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::default()
        }
    }

    /// Returns whether a principal is present and its session token is
    /// still considered valid, not merely that a principal object is
    /// cached.
    pub fn is_authenticated(&self) -> bool {
        !self.loading
            && self.principal.is_some()
            && self
                .session_expires_at
                .is_none_or(|expires_at| expires_at > Timestamp::now())
    }

    /// The global role from the profile, if one is assigned.
    pub fn global_role(&self) -> Option<Role> {
        if self.loading {
            return None;
        }
        self.profile.as_ref().and_then(Profile::global_role)
    }

    /// The membership for the active organization.
    pub fn active_membership(&self) -> Option<&OrgMembership> {
        let current = self.current_org?;
        self.memberships
            .iter()
            .find(|membership| membership.org_id == current)
    }

    /// The role scoped to the active organization, if any.
    pub fn org_role(&self) -> Option<Role> {
        if self.loading {
            return None;
        }
        self.active_membership().and_then(OrgMembership::org_role)
    }

    /// Every role the principal currently holds: the global role plus the
    /// active organization's role. Roles of non-active organizations do
    /// not count until that organization is selected.
    pub fn held_roles(&self) -> Vec<Role> {
        if !self.is_authenticated() {
            return Vec::new();
        }
        let mut roles = Vec::with_capacity(2);
        if let Some(global) = self.global_role() {
            roles.push(global);
        }
        if let Some(org) = self.org_role()
            && !roles.contains(&org)
        {
            roles.push(org);
        }
        roles
    }

    /// The single role used for display, after precedence reconciliation.
    pub fn effective_role(&self) -> Option<Role> {
        if !self.is_authenticated() {
            return None;
        }
        effective_role(self.global_role(), self.org_role())
    }

    /// Checks the action against the union of held roles.
    pub fn has_permission(&self, action: Action) -> bool {
        has_permission(self.held_roles(), action)
    }

    /// Returns whether the principal holds the given role, globally or in
    /// the active organization.
    pub fn has_role(&self, role: Role) -> bool {
        self.held_roles().contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            email_verified_at: None,
            created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
            last_sign_in_at: None,
        }
    }

    fn profile(id: Uuid, role: Role) -> Profile {
        Profile {
            id,
            role,
            created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
            updated_at: "2026-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    fn resolved(role: Role) -> AuthSnapshot {
        let principal = principal();
        let profile = profile(principal.id, role);
        AuthSnapshot {
            loading: false,
            principal: Some(principal),
            session_expires_at: None,
            profile: Some(profile),
            memberships: Vec::new(),
            current_org: None,
        }
    }

    #[test]
    fn test_startup_snapshot_is_loading_and_denies_everything() {
        let snapshot = AuthSnapshot::default();
        assert!(snapshot.loading);
        assert!(!snapshot.is_authenticated());
        assert_eq!(snapshot.effective_role(), None);
        assert!(!snapshot.has_permission(Action::ViewGuestDashboard));
        assert!(!snapshot.has_role(Role::User));
    }

    #[test]
    fn test_loading_denies_even_with_cached_role_data() {
        let mut snapshot = resolved(Role::SuperAdmin);
        snapshot.loading = true;
        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.has_permission(Action::ViewSuperDashboard));
        assert_eq!(snapshot.effective_role(), None);
    }

    #[test]
    fn test_unauthenticated_regardless_of_cached_role_data() {
        let mut snapshot = resolved(Role::Admin);
        snapshot.principal = None;
        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.has_permission(Action::ViewAdminDashboard));
    }

    #[test]
    fn test_expired_session_is_not_authenticated() {
        let mut snapshot = resolved(Role::User);
        snapshot.session_expires_at = Some("2020-01-01T00:00:00Z".parse().unwrap());
        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.has_permission(Action::ViewUserDashboard));
    }

    #[test]
    fn test_held_roles_union_global_and_active_org() {
        let mut snapshot = resolved(Role::User);
        let org_id = Uuid::from_u128(7);
        snapshot.memberships = vec![OrgMembership {
            org_id,
            org_name: "acme".into(),
            role: Role::OrgAdmin,
        }];
        snapshot.current_org = Some(org_id);

        assert_eq!(snapshot.held_roles(), vec![Role::User, Role::OrgAdmin]);
        // Union grants the org permission while the effective role is used
        // only for display.
        assert!(snapshot.has_permission(Action::InviteOrgUsers));
        assert!(snapshot.has_permission(Action::ViewUserDashboard));
        assert_eq!(snapshot.effective_role(), Some(Role::OrgAdmin));
    }

    #[test]
    fn test_inactive_org_roles_do_not_grant() {
        let mut snapshot = resolved(Role::User);
        snapshot.memberships = vec![OrgMembership {
            org_id: Uuid::from_u128(7),
            org_name: "acme".into(),
            role: Role::OrgAdmin,
        }];
        snapshot.current_org = None;
        assert!(!snapshot.has_permission(Action::InviteOrgUsers));
        assert_eq!(snapshot.effective_role(), Some(Role::User));
    }

    #[test]
    fn test_super_admin_precedence_over_org_role() {
        let mut snapshot = resolved(Role::SuperAdmin);
        let org_id = Uuid::from_u128(3);
        snapshot.memberships = vec![OrgMembership {
            org_id,
            org_name: "acme".into(),
            role: Role::User,
        }];
        snapshot.current_org = Some(org_id);
        assert_eq!(snapshot.effective_role(), Some(Role::SuperAdmin));
    }
}

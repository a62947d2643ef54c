//! Permission matrix: the single source of truth for "can role R do action A".

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::role::Role;

/// Opaque action identifiers gated by the permission matrix.
///
/// Actions carry no structure beyond their name; [`Action::All`] is the
/// designated wildcard meaning "every action". The matrix itself is the
/// [`Action::is_permitted_by_role`] function: pure, immutable, and shared
/// freely across concurrent readers.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// View the public landing dashboard.
    ViewGuestDashboard,
    /// View the personal user dashboard.
    ViewUserDashboard,
    /// View the administrative dashboard.
    ViewAdminDashboard,
    /// View the organization-admin dashboard.
    ViewOrgDashboard,
    /// View the super-admin dashboard.
    ViewSuperDashboard,
    /// View the invite-admin dashboard.
    ViewInviteDashboard,
    /// Edit the principal's own profile.
    EditOwnProfile,
    /// Create, update, and delete the principal's own tasks.
    ManageOwnTasks,
    /// List users and their roles.
    ViewUsers,
    /// Change another principal's global role.
    ManageUsers,
    /// Create and administer organizations.
    ManageOrgs,
    /// Invite a regular user.
    InviteUser,
    /// Invite an administrator.
    InviteAdmin,
    /// Invite users into the active organization.
    InviteOrgUsers,
    /// Revoke a pending invitation.
    RevokeInvite,
    /// Wildcard: every action, present and future.
    All,
}

impl Action {
    /// Checks whether the given role's permitted-action set covers this
    /// action, honoring the wildcard.
    pub const fn is_permitted_by_role(self, role: Role) -> bool {
        Action::All.is_in_role_set(role) || self.is_in_role_set(role)
    }

    /// The matrix proper: membership of this action in a role's set.
    ///
    /// `Unassigned` appears in no arm, so it maps to the empty set by
    /// construction and can never acquire the wildcard.
    const fn is_in_role_set(self, role: Role) -> bool {
        use Role::{Admin, Guest, InviteAdmin, OrgAdmin, SuperAdmin, User};

        match self {
            Self::ViewGuestDashboard => matches!(
                role,
                Guest | User | Admin | OrgAdmin | InviteAdmin | SuperAdmin
            ),
            Self::ViewUserDashboard => matches!(role, User),
            Self::ViewAdminDashboard => matches!(role, Admin),
            Self::ViewOrgDashboard => matches!(role, OrgAdmin),
            Self::ViewSuperDashboard => matches!(role, SuperAdmin),
            Self::ViewInviteDashboard => matches!(role, InviteAdmin),

            Self::EditOwnProfile => matches!(role, User | Admin | OrgAdmin | InviteAdmin),
            Self::ManageOwnTasks => matches!(role, User | Admin | OrgAdmin),

            Self::ViewUsers => matches!(role, Admin | OrgAdmin),
            Self::ManageUsers => matches!(role, Admin),
            Self::ManageOrgs => matches!(role, OrgAdmin),

            Self::InviteUser => matches!(role, Admin | OrgAdmin),
            Self::InviteAdmin => matches!(role, SuperAdmin),
            Self::InviteOrgUsers => matches!(role, OrgAdmin),
            Self::RevokeInvite => matches!(role, InviteAdmin),

            Self::All => matches!(role, SuperAdmin),
        }
    }

    /// Returns every concrete action the given role may perform.
    ///
    /// Derived from the same match as enforcement, so an overview rendered
    /// from this list cannot drift from what the guard actually allows. The
    /// wildcard expands; it is not itself listed.
    pub fn actions_for_role(role: Role) -> Vec<Self> {
        Self::iter()
            .filter(|action| !matches!(action, Self::All))
            .filter(|action| action.is_permitted_by_role(role))
            .collect()
    }

    /// Returns every concrete action a set of held roles may perform.
    ///
    /// The union over [`Action::actions_for_role`], in matrix order, for
    /// principals holding both a global and an org-scoped role.
    pub fn actions_for_role_set(roles: &[Role]) -> Vec<Self> {
        Self::iter()
            .filter(|action| !matches!(action, Self::All))
            .filter(|action| roles.iter().any(|role| action.is_permitted_by_role(*role)))
            .collect()
    }

    /// Returns a human-readable description of the action.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ViewGuestDashboard => "View the public landing dashboard",
            Self::ViewUserDashboard => "View the personal dashboard",
            Self::ViewAdminDashboard => "View the admin dashboard",
            Self::ViewOrgDashboard => "View the organization dashboard",
            Self::ViewSuperDashboard => "View the super-admin dashboard",
            Self::ViewInviteDashboard => "View the invite-admin dashboard",
            Self::EditOwnProfile => "Edit your own profile",
            Self::ManageOwnTasks => "Manage your own tasks",
            Self::ViewUsers => "View users and their roles",
            Self::ManageUsers => "Change user roles",
            Self::ManageOrgs => "Create and administer organizations",
            Self::InviteUser => "Invite a user",
            Self::InviteAdmin => "Invite an administrator",
            Self::InviteOrgUsers => "Invite users into the organization",
            Self::RevokeInvite => "Revoke a pending invitation",
            Self::All => "Every action",
        }
    }
}

/// Checks whether ANY of the held roles permits the action.
///
/// Pure function of the matrix, the roles, and the action; principals that
/// hold both a global role and an org-scoped role pass their full set here.
pub fn has_permission<I>(roles: I, action: Action) -> bool
where
    I: IntoIterator<Item = Role>,
{
    roles.into_iter().any(|role| action.is_permitted_by_role(role))
}

/// One row of the permissions overview: a role and its permitted actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    /// The role this row describes.
    pub role: Role,
    /// Every concrete action the role may perform.
    pub actions: Vec<Action>,
}

/// Renders the full matrix as overview rows, one per role.
///
/// Consumed by any "permissions overview" display; backed by the same
/// function the guard enforces with.
pub fn permissions_overview() -> Vec<MatrixRow> {
    Role::iter()
        .map(|role| MatrixRow {
            role,
            actions: Action::actions_for_role(role),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_is_deterministic_for_every_pair() {
        for role in Role::iter() {
            for action in Action::iter() {
                let first = action.is_permitted_by_role(role);
                let second = action.is_permitted_by_role(role);
                assert_eq!(first, second, "{role}/{action} flapped");
            }
        }
    }

    #[test]
    fn test_unassigned_role_has_empty_permission_set() {
        for action in Action::iter() {
            assert!(
                !action.is_permitted_by_role(Role::Unassigned),
                "unassigned must never hold {action}"
            );
        }
        assert!(Action::actions_for_role(Role::Unassigned).is_empty());
    }

    #[test]
    fn test_super_admin_wildcard_covers_everything() {
        for action in Action::iter() {
            assert!(action.is_permitted_by_role(Role::SuperAdmin));
        }
    }

    #[test]
    fn test_dashboard_views_are_role_exclusive() {
        assert!(Action::ViewUserDashboard.is_permitted_by_role(Role::User));
        assert!(!Action::ViewUserDashboard.is_permitted_by_role(Role::Admin));

        assert!(Action::ViewAdminDashboard.is_permitted_by_role(Role::Admin));
        assert!(!Action::ViewAdminDashboard.is_permitted_by_role(Role::User));

        assert!(Action::ViewOrgDashboard.is_permitted_by_role(Role::OrgAdmin));
        assert!(!Action::ViewOrgDashboard.is_permitted_by_role(Role::Admin));

        assert!(Action::ViewInviteDashboard.is_permitted_by_role(Role::InviteAdmin));
        assert!(!Action::ViewInviteDashboard.is_permitted_by_role(Role::Guest));
    }

    #[test]
    fn test_invite_permissions() {
        // Inviting regular users is an admin-level action.
        assert!(Action::InviteUser.is_permitted_by_role(Role::Admin));
        assert!(Action::InviteUser.is_permitted_by_role(Role::OrgAdmin));
        assert!(!Action::InviteUser.is_permitted_by_role(Role::User));

        // Inviting into an org is org-admin territory.
        assert!(Action::InviteOrgUsers.is_permitted_by_role(Role::OrgAdmin));
        assert!(!Action::InviteOrgUsers.is_permitted_by_role(Role::User));
        assert!(!Action::InviteOrgUsers.is_permitted_by_role(Role::Admin));

        // Only super admins mint new admins.
        assert!(Action::InviteAdmin.is_permitted_by_role(Role::SuperAdmin));
        assert!(!Action::InviteAdmin.is_permitted_by_role(Role::Admin));

        // Revocation belongs to invite admins (and the wildcard).
        assert!(Action::RevokeInvite.is_permitted_by_role(Role::InviteAdmin));
        assert!(!Action::RevokeInvite.is_permitted_by_role(Role::OrgAdmin));
    }

    #[test]
    fn test_guest_only_sees_the_landing_dashboard() {
        let actions = Action::actions_for_role(Role::Guest);
        assert_eq!(actions, vec![Action::ViewGuestDashboard]);
    }

    #[test]
    fn test_has_permission_unions_held_roles() {
        let held = [Role::User, Role::OrgAdmin];
        assert!(has_permission(held, Action::InviteOrgUsers));
        assert!(has_permission(held, Action::ViewUserDashboard));
        assert!(!has_permission(held, Action::ManageUsers));
        assert!(!has_permission([], Action::ViewGuestDashboard));
    }

    #[test]
    fn test_actions_for_role_set_is_the_union() {
        let actions = Action::actions_for_role_set(&[Role::User, Role::InviteAdmin]);
        assert!(actions.contains(&Action::ViewUserDashboard));
        assert!(actions.contains(&Action::RevokeInvite));
        assert!(!actions.contains(&Action::ManageOrgs));
    }

    #[test]
    fn test_overview_matches_enforcement() {
        for row in permissions_overview() {
            for action in Action::iter().filter(|a| !matches!(a, Action::All)) {
                assert_eq!(
                    row.actions.contains(&action),
                    action.is_permitted_by_role(row.role),
                    "overview drifted from enforcement for {}/{action}",
                    row.role
                );
            }
        }
    }

    #[test]
    fn test_action_serializes_as_snake_case() {
        assert_eq!(Action::InviteOrgUsers.to_string(), "invite_org_users");
        assert_eq!(
            serde_json::to_string(&Action::EditOwnProfile).unwrap(),
            "\"edit_own_profile\""
        );
        assert_eq!("all".parse::<Action>().unwrap(), Action::All);
    }
}

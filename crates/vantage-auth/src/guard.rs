//! Declarative gate for protected content.

use vantage_core::{Action, Role};

use crate::snapshot::AuthSnapshot;

/// A reusable gate evaluating a required role set and/or required action
/// against an authorization snapshot.
///
/// Authentication is always checked before roles or permissions: a null
/// principal short-circuits to [`GuardOutcome::Unauthenticated`] and no
/// permission logic runs for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteGuard {
    required_roles: Vec<Role>,
    required_action: Option<Action>,
    entry_point: Option<String>,
}

/// Default redirect target for unauthenticated visitors.
pub const DEFAULT_ENTRY_POINT: &str = "/";

impl RouteGuard {
    /// A guard requiring authentication only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the principal to hold this role (any of, if called
    /// repeatedly).
    pub fn require_role(mut self, role: Role) -> Self {
        self.required_roles.push(role);
        self
    }

    /// Requires the principal to hold any role of the given set.
    pub fn require_any_role(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles.extend(roles);
        self
    }

    /// Requires the given action to be permitted.
    pub fn require_action(mut self, action: Action) -> Self {
        self.required_action = Some(action);
        self
    }

    /// Overrides the entry point unauthenticated visitors are sent to.
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    /// Evaluates the gate for one requested location.
    pub fn evaluate(&self, snapshot: &AuthSnapshot, requested: &str) -> GuardOutcome {
        if snapshot.loading {
            return GuardOutcome::Loading;
        }

        if !snapshot.is_authenticated() {
            return GuardOutcome::Unauthenticated(EntryRedirect {
                to: self
                    .entry_point
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_owned()),
                from: requested.to_owned(),
            });
        }

        let role_satisfied = self.required_roles.is_empty()
            || self
                .required_roles
                .iter()
                .any(|role| snapshot.has_role(*role));
        let action_satisfied = self
            .required_action
            .is_none_or(|action| snapshot.has_permission(action));

        if role_satisfied && action_satisfied {
            GuardOutcome::Authorized
        } else {
            GuardOutcome::Denied(Denial {
                required_roles: self.required_roles.clone(),
                required_action: self.required_action,
                actual_role: snapshot.effective_role(),
            })
        }
    }
}

/// The state a guarded route is in.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Role resolution is still in flight; render a placeholder, decide
    /// once loading completes.
    Loading,
    /// Render the protected content.
    Authorized,
    /// Render the denial view. Carries what was required and what the
    /// principal actually holds; no protected data.
    Denied(Denial),
    /// Redirect to the entry point, preserving the requested location so
    /// the visitor can return post-login.
    Unauthenticated(EntryRedirect),
}

impl GuardOutcome {
    /// Returns whether the protected content may be rendered.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// What a denial view displays.
#[derive(Debug, Clone, PartialEq)]
pub struct Denial {
    /// Roles that would have satisfied the guard.
    pub required_roles: Vec<Role>,
    /// Action that would have satisfied the guard.
    pub required_action: Option<Action>,
    /// The principal's actual effective role.
    pub actual_role: Option<Role>,
}

impl Denial {
    /// Renders the user-facing denial message.
    pub fn message(&self) -> String {
        let actual = self
            .actual_role
            .map_or_else(|| "none".to_owned(), |role| role.to_string());
        format!("You do not have access to this feature. Your current role: {actual}")
    }
}

/// Redirect to the configured entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRedirect {
    /// Where to send the visitor.
    pub to: String,
    /// The originally requested location, to return to post-login.
    pub from: String,
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use uuid::Uuid;
    use vantage_core::{OrgMembership, Principal, Profile};

    use super::*;

    fn snapshot_with_role(role: Role) -> AuthSnapshot {
        let id = Uuid::new_v4();
        let at: Timestamp = "2026-01-01T00:00:00Z".parse().unwrap();
        AuthSnapshot {
            loading: false,
            principal: Some(Principal {
                id,
                email: "user@example.com".into(),
                email_verified_at: Some(at),
                created_at: at,
                last_sign_in_at: Some(at),
            }),
            session_expires_at: None,
            profile: Some(Profile {
                id,
                role,
                created_at: at,
                updated_at: at,
            }),
            memberships: Vec::new(),
            current_org: None,
        }
    }

    #[test]
    fn test_loading_state_wins_over_everything() {
        let mut snapshot = snapshot_with_role(Role::SuperAdmin);
        snapshot.loading = true;
        let guard = RouteGuard::new().require_role(Role::SuperAdmin);
        assert_eq!(guard.evaluate(&snapshot, "/super-admin"), GuardOutcome::Loading);
    }

    #[test]
    fn test_unauthenticated_redirect_preserves_location() {
        let guard = RouteGuard::new()
            .require_role(Role::Admin)
            .with_entry_point("/login");
        let outcome = guard.evaluate(&AuthSnapshot::signed_out(), "/admin");
        assert_eq!(
            outcome,
            GuardOutcome::Unauthenticated(EntryRedirect {
                to: "/login".into(),
                from: "/admin".into(),
            })
        );
    }

    #[test]
    fn test_authentication_is_checked_before_permissions() {
        // A signed-out snapshot never reaches the role check, even though
        // it would also fail it.
        let guard = RouteGuard::new().require_role(Role::Admin);
        let outcome = guard.evaluate(&AuthSnapshot::signed_out(), "/admin");
        assert!(matches!(outcome, GuardOutcome::Unauthenticated(_)));
    }

    #[test]
    fn test_denial_reports_actual_role() {
        let guard = RouteGuard::new().require_role(Role::Admin);
        let outcome = guard.evaluate(&snapshot_with_role(Role::User), "/admin");
        let GuardOutcome::Denied(denial) = outcome else {
            panic!("expected denial");
        };
        assert_eq!(denial.actual_role, Some(Role::User));
        assert_eq!(
            denial.message(),
            "You do not have access to this feature. Your current role: user"
        );
    }

    #[test]
    fn test_role_set_passes_on_any_intersection() {
        let guard = RouteGuard::new().require_any_role([Role::Admin, Role::OrgAdmin]);
        let mut snapshot = snapshot_with_role(Role::User);
        let org_id = Uuid::from_u128(5);
        snapshot.memberships = vec![OrgMembership {
            org_id,
            org_name: "acme".into(),
            role: Role::OrgAdmin,
        }];
        snapshot.current_org = Some(org_id);

        assert!(guard.evaluate(&snapshot, "/org-admin").is_authorized());
    }

    #[test]
    fn test_action_requirement() {
        let guard = RouteGuard::new().require_action(Action::InviteUser);
        assert!(guard
            .evaluate(&snapshot_with_role(Role::Admin), "/invite")
            .is_authorized());
        assert!(matches!(
            guard.evaluate(&snapshot_with_role(Role::User), "/invite"),
            GuardOutcome::Denied(_)
        ));
    }

    #[test]
    fn test_role_and_action_must_both_hold() {
        let guard = RouteGuard::new()
            .require_role(Role::Admin)
            .require_action(Action::ManageOrgs);
        // Admin holds the role but not the action.
        assert!(matches!(
            guard.evaluate(&snapshot_with_role(Role::Admin), "/orgs"),
            GuardOutcome::Denied(_)
        ));
        // Super admin holds both via the wildcard.
        let guard = RouteGuard::new()
            .require_any_role([Role::Admin, Role::SuperAdmin])
            .require_action(Action::ManageOrgs);
        assert!(guard
            .evaluate(&snapshot_with_role(Role::SuperAdmin), "/orgs")
            .is_authorized());
    }

    #[test]
    fn test_guard_without_requirements_only_needs_authentication() {
        let guard = RouteGuard::new();
        assert!(guard
            .evaluate(&snapshot_with_role(Role::Guest), "/profile")
            .is_authorized());
        assert!(matches!(
            guard.evaluate(&AuthSnapshot::signed_out(), "/profile"),
            GuardOutcome::Unauthenticated(_)
        ));
    }
}

//! Organization and membership models for multi-tenant role scoping.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// A tenant boundary. Principals may hold a different role per organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique organization identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// Associates a principal with one organization and an org-scoped role.
///
/// The org-scoped role is independent of the principal's global role; at
/// most one membership is "active" per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    /// Organization the principal belongs to.
    pub org_id: Uuid,
    /// Organization display name, denormalized for rendering.
    pub org_name: String,
    /// Role held within this organization.
    pub role: Role,
}

impl OrgMembership {
    /// Returns the org-scoped role as an `Option`, `None` when unassigned.
    pub fn org_role(&self) -> Option<Role> {
        self.role.assigned()
    }
}

/// One user row of an organization's member listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgUser {
    /// Principal id of the member.
    pub user_id: Uuid,
    /// Member email, denormalized from the profile for rendering.
    pub email: String,
    /// Role held within the organization.
    pub role: Role,
}

/// Sorts memberships by organization id.
///
/// The backend does not guarantee a deterministic order; sorting by the
/// stable key keeps default active-org selection (first membership) from
/// flapping across refreshes.
pub fn sort_memberships(memberships: &mut [OrgMembership]) {
    memberships.sort_by_key(|membership| membership.org_id);
}

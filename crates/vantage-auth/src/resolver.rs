//! Role resolution: concurrent profile and membership fetches.

use std::time::Duration;

use uuid::Uuid;
use vantage_core::{OrgMembership, Profile, sort_memberships};

use crate::TRACING_TARGET_RESOLVER;
use crate::provider::RbacStore;

/// The outcome of one role resolution pass.
///
/// Fetch failures degrade to the empty outcome instead of erroring: a
/// principal whose role data cannot be loaded holds no role until the next
/// session event or explicit refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRoles {
    /// Profile carrying the global role, when the fetch succeeded.
    pub profile: Option<Profile>,
    /// Memberships sorted by organization id.
    pub memberships: Vec<OrgMembership>,
}

/// Resolves the principal's global role and organization memberships.
///
/// Both fetches run concurrently, bounding latency to the slower of the
/// two calls rather than their sum, and the whole pass is capped by
/// `timeout` so the UI can never hang in a loading state indefinitely.
/// Failures and timeouts are recoverable: they log and yield no role.
pub async fn resolve_roles(
    store: &dyn RbacStore,
    principal_id: Uuid,
    timeout: Duration,
) -> ResolvedRoles {
    match tokio::time::timeout(timeout, fetch_role_data(store, principal_id)).await {
        Ok(resolved) => resolved,
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET_RESOLVER,
                %principal_id,
                timeout_ms = timeout.as_millis(),
                "role resolution timed out, degrading to no role"
            );
            ResolvedRoles::default()
        }
    }
}

async fn fetch_role_data(store: &dyn RbacStore, principal_id: Uuid) -> ResolvedRoles {
    let (profile, memberships) = tokio::join!(
        store.fetch_profile(principal_id),
        store.fetch_memberships(principal_id),
    );

    let profile = profile.unwrap_or_else(|error| {
        tracing::warn!(
            target: TRACING_TARGET_RESOLVER,
            %principal_id,
            error = %error,
            "profile fetch failed, treating global role as unassigned"
        );
        None
    });

    let mut memberships = memberships.unwrap_or_else(|error| {
        tracing::warn!(
            target: TRACING_TARGET_RESOLVER,
            %principal_id,
            error = %error,
            "membership fetch failed, treating memberships as empty"
        );
        Vec::new()
    });
    sort_memberships(&mut memberships);

    tracing::debug!(
        target: TRACING_TARGET_RESOLVER,
        %principal_id,
        global_role = ?profile.as_ref().map(|p| p.role),
        membership_count = memberships.len(),
        "role resolution completed"
    );

    ResolvedRoles {
        profile,
        memberships,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vantage_core::Role;

    use super::*;
    use crate::mock::MockRbacStore;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_resolves_profile_and_memberships_together() {
        let principal_id = Uuid::new_v4();
        let store = MockRbacStore::new();
        store.insert_profile(principal_id, Role::User);
        store.insert_membership(principal_id, Uuid::from_u128(2), "beta", Role::User);
        store.insert_membership(principal_id, Uuid::from_u128(1), "alpha", Role::OrgAdmin);

        let resolved = resolve_roles(&store, principal_id, TIMEOUT).await;
        assert_eq!(resolved.profile.unwrap().role, Role::User);
        // Sorted by org id, whatever order the backend returned.
        assert_eq!(resolved.memberships[0].org_name, "alpha");
        assert_eq!(resolved.memberships[1].org_name, "beta");
    }

    #[tokio::test]
    async fn test_profile_failure_degrades_to_no_role() {
        let principal_id = Uuid::new_v4();
        let store = MockRbacStore::new();
        store.insert_membership(principal_id, Uuid::from_u128(1), "alpha", Role::User);
        store.fail_profile_fetches();

        let resolved = resolve_roles(&store, principal_id, TIMEOUT).await;
        assert_eq!(resolved.profile, None);
        assert_eq!(resolved.memberships.len(), 1);
    }

    #[tokio::test]
    async fn test_membership_failure_degrades_to_empty() {
        let principal_id = Uuid::new_v4();
        let store = MockRbacStore::new();
        store.insert_profile(principal_id, Role::Admin);
        store.fail_membership_fetches();

        let resolved = resolve_roles(&store, principal_id, TIMEOUT).await;
        assert_eq!(resolved.profile.unwrap().role, Role::Admin);
        assert!(resolved.memberships.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out_to_no_role() {
        let principal_id = Uuid::new_v4();
        let store = Arc::new(MockRbacStore::new());
        store.insert_profile(principal_id, Role::Admin);
        let gate = store.hold_fetches_for(principal_id);

        let task = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                resolve_roles(&*store, principal_id, Duration::from_millis(100)).await
            })
        };
        // Never release the gate; the timeout fires under the paused clock.
        let resolved = task.await.unwrap();
        assert_eq!(resolved, ResolvedRoles::default());
        drop(gate);
    }
}

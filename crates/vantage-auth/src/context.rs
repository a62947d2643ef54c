//! The authorization facade: the single entry point for access decisions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;
use vantage_core::{Action, Credentials, OrgMembership, Result, Role, SignUpRequest};

use crate::TRACING_TARGET_SESSION;
use crate::provider::{AuthEvent, AuthProvider, AuthSession, RbacStore};
use crate::resolver::resolve_roles;
use crate::snapshot::AuthSnapshot;

/// Default cap on one role-resolution pass.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning knobs for an [`AuthContext`].
#[derive(Debug, Clone)]
pub struct AuthContextConfig {
    /// Cap on one role-resolution pass; on expiry the principal holds no
    /// role until the next session event or explicit refresh.
    pub resolve_timeout: Duration,
}

impl Default for AuthContextConfig {
    fn default() -> Self {
        Self {
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }
}

struct Inner {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn RbacStore>,
    config: AuthContextConfig,
    /// Holds the current snapshot; the watch lock serializes every state
    /// transition, and subscribers re-evaluate on change without polling.
    state: watch::Sender<AuthSnapshot>,
    /// Monotonic counter identifying the newest session change. A
    /// resolution publishes only if its generation is still current.
    generation: AtomicU64,
    /// Whether a provider event listener is attached. When it is, auth
    /// operations rely on the emitted event so each change resolves
    /// exactly once.
    listening: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// Authorization facade with explicit lifecycle.
///
/// Instances are independent: construct one per application (or per test)
/// with injected collaborators, [`initialize`](Self::initialize) it, and
/// optionally [`spawn_listener`](Self::spawn_listener) to follow the
/// provider's auth state changes for the lifetime of the application.
///
/// All query methods are safe to call at any point; before resolution
/// completes they answer with conservative denials.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("snapshot", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    /// Creates a facade with default configuration.
    pub fn new(provider: Arc<dyn AuthProvider>, store: Arc<dyn RbacStore>) -> Self {
        Self::with_config(provider, store, AuthContextConfig::default())
    }

    /// Creates a facade with the given configuration.
    pub fn with_config(
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn RbacStore>,
        config: AuthContextConfig,
    ) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                store,
                config,
                state,
                generation: AtomicU64::new(0),
                listening: AtomicBool::new(false),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Fetches the current session from the provider and resolves roles.
    ///
    /// A provider failure is recoverable: the principal is treated as
    /// absent and loading completes, so the application renders the
    /// unauthenticated state rather than crashing or hanging.
    pub async fn initialize(&self) {
        match self.inner.provider.get_session().await {
            Ok(Some(session)) => self.establish(session).await,
            Ok(None) => self.apply_signed_out(),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_SESSION,
                    error = %error,
                    "session fetch failed, treating principal as absent"
                );
                self.apply_signed_out();
            }
        }
    }

    /// Subscribes to the provider's auth state changes and follows them
    /// until [`teardown`](Self::teardown).
    ///
    /// Each event triggers role re-resolution exactly once; auth
    /// operations on this facade stop resolving directly and defer to the
    /// emitted event instead.
    pub fn spawn_listener(&self) {
        let mut events = self.inner.provider.subscribe();
        let context = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                context.handle_event(event);
            }
        });
        self.inner.listening.store(true, Ordering::SeqCst);
        if let Some(previous) = self.inner.listener.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    /// Stops following provider events and clears the authorization state.
    pub fn teardown(&self) {
        if let Some(handle) = self.inner.listener.lock().unwrap().take() {
            handle.abort();
        }
        self.inner.listening.store(false, Ordering::SeqCst);
        self.apply_signed_out();
    }

    /// Applies one auth state change.
    ///
    /// Session presence is recorded in arrival order; the resolution fetch
    /// runs in the background so a slow backend never delays newer events.
    /// Must be called from within a tokio runtime.
    pub fn handle_event(&self, event: AuthEvent) {
        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            event = event.name(),
            "auth state changed"
        );
        match event.into_session() {
            None => self.apply_signed_out(),
            Some(session) => {
                let generation = self.apply_session(&session);
                let context = self.clone();
                tokio::spawn(async move {
                    context
                        .resolve_and_publish(session.principal.id, generation)
                        .await;
                });
            }
        }
    }

    /// Re-runs role resolution for the current principal.
    ///
    /// The user-triggered retry path after a transient fetch failure; a
    /// no-op when signed out.
    pub async fn refresh(&self) {
        let principal_id = {
            let snapshot = self.inner.state.borrow();
            snapshot.principal.as_ref().map(|principal| principal.id)
        };
        let Some(principal_id) = principal_id else {
            return;
        };
        let mut generation = 0;
        self.inner.state.send_modify(|snapshot| {
            generation = self.next_generation();
            snapshot.loading = true;
        });
        self.resolve_and_publish(principal_id, generation).await;
    }

    /// Switches the active organization context.
    ///
    /// Rejected silently when the principal holds no membership for the
    /// organization, so an org role can never leak across organizations.
    pub fn select_organization(&self, org_id: Uuid) {
        self.inner.state.send_if_modified(|snapshot| {
            if snapshot.loading {
                return false;
            }
            let holds_membership = snapshot
                .memberships
                .iter()
                .any(|membership| membership.org_id == org_id);
            if !holds_membership {
                tracing::debug!(
                    target: TRACING_TARGET_SESSION,
                    %org_id,
                    "ignoring switch to organization without membership"
                );
                return false;
            }
            if snapshot.current_org == Some(org_id) {
                return false;
            }
            snapshot.current_org = Some(org_id);
            true
        });
    }

    /// Signs in with an email/password pair, validated locally first.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<()> {
        let credentials = credentials.validated()?;
        let session = self
            .inner
            .provider
            .sign_in_with_password(&credentials)
            .await?;
        if !self.is_listening() {
            self.establish(session).await;
        }
        Ok(())
    }

    /// Registers a new account.
    ///
    /// Returns `true` when the provider issued a session immediately;
    /// `false` when email confirmation is pending.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<bool> {
        let request = request.validated()?;
        let session = self
            .inner
            .provider
            .sign_up(&request.into_credentials())
            .await?;
        match session {
            Some(session) => {
                if !self.is_listening() {
                    self.establish(session).await;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Signs the current principal out.
    ///
    /// Local state is cleared even when the provider call fails; a
    /// sign-out must never leave stale grants behind.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.inner.provider.sign_out().await;
        if !self.is_listening() || result.is_err() {
            self.apply_signed_out();
        }
        result
    }

    /// Requests a password-reset email.
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.inner.provider.reset_password_for_email(email).await
    }

    /// The current state, cloned.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.state.subscribe()
    }

    /// Whether role resolution is still in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Whether a principal is present with a provider-valid session.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// The single role used for display.
    pub fn effective_role(&self) -> Option<Role> {
        self.inner.state.borrow().effective_role()
    }

    /// Checks the action against the union of held roles.
    pub fn has_permission(&self, action: Action) -> bool {
        self.inner.state.borrow().has_permission(action)
    }

    /// Whether the principal holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.inner.state.borrow().has_role(role)
    }

    /// Memberships of the current principal, sorted by organization id.
    pub fn memberships(&self) -> Vec<OrgMembership> {
        self.inner.state.borrow().memberships.clone()
    }

    /// The store collaborator, for role-gated data operations.
    pub fn store(&self) -> &Arc<dyn RbacStore> {
        &self.inner.store
    }

    fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    fn next_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records the session and resolves roles inline.
    async fn establish(&self, session: AuthSession) {
        let generation = self.apply_session(&session);
        self.resolve_and_publish(session.principal.id, generation).await;
    }

    /// Records session presence and enters the loading state.
    ///
    /// Role data of a different principal is dropped immediately; for the
    /// same principal it is kept but inert, since loading denies all.
    fn apply_session(&self, session: &AuthSession) -> u64 {
        let mut generation = 0;
        self.inner.state.send_modify(|snapshot| {
            generation = self.next_generation();
            let same_principal = snapshot
                .principal
                .as_ref()
                .is_some_and(|principal| principal.id == session.principal.id);
            snapshot.loading = true;
            snapshot.principal = Some(session.principal.clone());
            snapshot.session_expires_at = session.expires_at;
            if !same_principal {
                snapshot.profile = None;
                snapshot.memberships.clear();
                snapshot.current_org = None;
            }
        });
        generation
    }

    /// Clears all authorization state. Takes effect immediately: no
    /// resolution cycle runs between sign-out and denial.
    fn apply_signed_out(&self) {
        self.inner.state.send_modify(|snapshot| {
            self.next_generation();
            *snapshot = AuthSnapshot::signed_out();
        });
        tracing::info!(
            target: TRACING_TARGET_SESSION,
            "principal signed out, authorization state cleared"
        );
    }

    /// Resolves roles and publishes, unless a newer change superseded us.
    async fn resolve_and_publish(&self, principal_id: Uuid, generation: u64) {
        let resolved = resolve_roles(
            &*self.inner.store,
            principal_id,
            self.inner.config.resolve_timeout,
        )
        .await;
        let applied = self.inner.state.send_if_modified(|snapshot| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            snapshot.profile = resolved.profile;
            snapshot.memberships = resolved.memberships;
            let current_org = select_current_org(snapshot.current_org, &snapshot.memberships);
            snapshot.current_org = current_org;
            snapshot.loading = false;
            true
        });
        if !applied {
            tracing::debug!(
                target: TRACING_TARGET_SESSION,
                %principal_id,
                generation,
                "discarding stale role resolution"
            );
        }
    }
}

/// Keeps the previous active org while the principal still belongs to it;
/// otherwise defaults to the first membership in sorted order.
fn select_current_org(previous: Option<Uuid>, memberships: &[OrgMembership]) -> Option<Uuid> {
    previous
        .filter(|org_id| {
            memberships
                .iter()
                .any(|membership| membership.org_id == *org_id)
        })
        .or_else(|| memberships.first().map(|membership| membership.org_id))
}

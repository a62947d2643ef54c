//! In-memory collaborator implementations for tests.
//!
//! These mirror the behavior of the HTTP clients in `vantage-reqwest`
//! closely enough to drive the engine through every lifecycle scenario:
//! configurable failures, gated (slow) fetches, and event emission on
//! auth-mutating calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::{Semaphore, mpsc};
use uuid::Uuid;
use vantage_core::{
    Credentials, Error, Invite, NewInvite, NewTask, OrgMembership, OrgUser, Principal, Profile,
    Result, Role, Task, UpdateTask,
};

use crate::provider::{AuthEvent, AuthProvider, AuthSession, InviteSender, RbacStore};

fn now() -> Timestamp {
    Timestamp::now()
}

/// Builds a principal/session pair for an email address.
pub fn session_for(email: &str) -> AuthSession {
    AuthSession {
        access_token: format!("token-{email}"),
        expires_at: None,
        principal: Principal {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            email_verified_at: Some(now()),
            created_at: now(),
            last_sign_in_at: Some(now()),
        },
    }
}

#[derive(Default)]
struct ProviderState {
    session: Option<AuthSession>,
    accounts: HashMap<String, (String, AuthSession)>,
    fail_get_session: bool,
}

/// In-memory [`AuthProvider`] with controllable accounts and sessions.
#[derive(Default)]
pub struct MockAuthProvider {
    state: Mutex<ProviderState>,
    listeners: Mutex<Vec<mpsc::Sender<AuthEvent>>>,
    reset_requests: Mutex<Vec<String>>,
}

impl MockAuthProvider {
    /// Creates a provider with no current session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that already holds a valid session.
    pub fn with_session(session: AuthSession) -> Self {
        let provider = Self::new();
        provider.state.lock().unwrap().session = Some(session);
        provider
    }

    /// Registers an account the provider will accept credentials for.
    pub fn register_account(&self, email: &str, password: &str, session: AuthSession) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(email.to_owned(), (password.to_owned(), session));
    }

    /// Makes every `get_session` call fail with a network error.
    pub fn fail_session_fetches(&self) {
        self.state.lock().unwrap().fail_get_session = true;
    }

    /// Returns the emails password resets were requested for.
    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests.lock().unwrap().clone()
    }

    /// Delivers an event to every subscriber.
    pub async fn emit(&self, event: AuthEvent) {
        let senders: Vec<_> = {
            let mut listeners = self.listeners.lock().unwrap();
            listeners.retain(|sender| !sender.is_closed());
            listeners.clone()
        };
        for sender in senders {
            let _ = sender.send(event.clone()).await;
        }
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn get_session(&self) -> Result<Option<AuthSession>> {
        let state = self.state.lock().unwrap();
        if state.fail_get_session {
            return Err(Error::network_error().with_message("provider unreachable"));
        }
        Ok(state.session.clone())
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<AuthSession> {
        let session = {
            let mut state = self.state.lock().unwrap();
            let (password, session) = state
                .accounts
                .get(&credentials.email)
                .cloned()
                .ok_or_else(|| Error::authentication().with_message("invalid login credentials"))?;
            if password != credentials.password {
                return Err(Error::authentication().with_message("invalid login credentials"));
            }
            state.session = Some(session.clone());
            session
        };
        self.emit(AuthEvent::SignedIn(session.clone())).await;
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<AuthSession>> {
        // Mirrors a provider configured to require email confirmation: the
        // account exists but no session is issued yet.
        let session = session_for(&credentials.email);
        self.state.lock().unwrap().accounts.insert(
            credentials.email.clone(),
            (credentials.password.clone(), session),
        );
        Ok(None)
    }

    async fn sign_out(&self) -> Result<()> {
        self.state.lock().unwrap().session = None;
        self.emit(AuthEvent::SignedOut).await;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        self.reset_requests.lock().unwrap().push(email.to_owned());
        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<AuthEvent> {
        let (sender, receiver) = mpsc::channel(16);
        self.listeners.lock().unwrap().push(sender);
        receiver
    }
}

/// In-memory [`RbacStore`] with controllable failures and gated fetches.
#[derive(Default)]
pub struct MockRbacStore {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    memberships: Mutex<HashMap<Uuid, Vec<OrgMembership>>>,
    org_users: Mutex<HashMap<Uuid, Vec<OrgUser>>>,
    invites: Mutex<Vec<Invite>>,
    tasks: Mutex<Vec<Task>>,
    fail_profiles: AtomicBool,
    fail_memberships: AtomicBool,
    hold: Mutex<Option<(Uuid, Arc<Semaphore>)>>,
    profile_fetches: AtomicUsize,
    membership_fetches: AtomicUsize,
}

impl MockRbacStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a profile with the given global role.
    pub fn insert_profile(&self, principal_id: Uuid, role: Role) {
        let profile = Profile {
            id: principal_id,
            role,
            created_at: now(),
            updated_at: now(),
        };
        self.profiles.lock().unwrap().insert(principal_id, profile);
    }

    /// Inserts an organization membership for the principal.
    pub fn insert_membership(&self, principal_id: Uuid, org_id: Uuid, name: &str, role: Role) {
        self.memberships
            .lock()
            .unwrap()
            .entry(principal_id)
            .or_default()
            .push(OrgMembership {
                org_id,
                org_name: name.to_owned(),
                role,
            });
    }

    /// Inserts one member row into an organization's listing.
    pub fn insert_org_user(&self, org_id: Uuid, user: OrgUser) {
        self.org_users
            .lock()
            .unwrap()
            .entry(org_id)
            .or_default()
            .push(user);
    }

    /// Makes profile fetches fail with a network error.
    pub fn fail_profile_fetches(&self) {
        self.fail_profiles.store(true, Ordering::SeqCst);
    }

    /// Makes membership fetches fail with a network error.
    pub fn fail_membership_fetches(&self) {
        self.fail_memberships.store(true, Ordering::SeqCst);
    }

    /// Blocks fetches for one principal until [`Self::release_fetches`].
    pub fn hold_fetches_for(&self, principal_id: Uuid) -> Arc<Semaphore> {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.hold.lock().unwrap() = Some((principal_id, Arc::clone(&semaphore)));
        semaphore
    }

    /// Releases every held fetch, current and future.
    pub fn release_fetches(&self) {
        if let Some((_, semaphore)) = self.hold.lock().unwrap().take() {
            semaphore.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    /// Number of profile fetches issued so far.
    pub fn profile_fetch_count(&self) -> usize {
        self.profile_fetches.load(Ordering::SeqCst)
    }

    /// Pending invites currently stored.
    pub fn stored_invites(&self) -> Vec<Invite> {
        self.invites.lock().unwrap().clone()
    }

    async fn gate(&self, principal_id: Uuid) {
        let semaphore = {
            let hold = self.hold.lock().unwrap();
            hold.as_ref()
                .filter(|(held_id, _)| *held_id == principal_id)
                .map(|(_, semaphore)| Arc::clone(semaphore))
        };
        if let Some(semaphore) = semaphore {
            let _permit = semaphore.acquire().await;
        }
    }
}

#[async_trait]
impl RbacStore for MockRbacStore {
    async fn fetch_profile(&self, principal_id: Uuid) -> Result<Option<Profile>> {
        self.profile_fetches.fetch_add(1, Ordering::SeqCst);
        self.gate(principal_id).await;
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(Error::network_error().with_message("profiles unavailable"));
        }
        Ok(self.profiles.lock().unwrap().get(&principal_id).cloned())
    }

    async fn fetch_memberships(&self, principal_id: Uuid) -> Result<Vec<OrgMembership>> {
        self.membership_fetches.fetch_add(1, Ordering::SeqCst);
        self.gate(principal_id).await;
        if self.fail_memberships.load(Ordering::SeqCst) {
            return Err(Error::network_error().with_message("memberships unavailable"));
        }
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .get(&principal_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_role(&self, principal_id: Uuid, role: Role) -> Result<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&principal_id)
            .ok_or_else(|| Error::not_found().with_message("profile not found"))?;
        profile.role = role;
        profile.updated_at = now();
        Ok(profile.clone())
    }

    async fn list_org_users(&self, org_id: Uuid) -> Result<Vec<OrgUser>> {
        Ok(self
            .org_users
            .lock()
            .unwrap()
            .get(&org_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_invites(&self) -> Result<Vec<Invite>> {
        Ok(self.invites.lock().unwrap().clone())
    }

    async fn create_invite(&self, invite: &NewInvite) -> Result<Invite> {
        let stored = Invite {
            id: Uuid::new_v4(),
            email: invite.email.clone(),
            role: invite.role,
            org_id: invite.org_id,
            created_at: now(),
        };
        self.invites.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete_invite(&self, invite_id: Uuid) -> Result<()> {
        let mut invites = self.invites.lock().unwrap();
        let before = invites.len();
        invites.retain(|invite| invite.id != invite_id);
        if invites.len() == before {
            return Err(Error::not_found().with_message("invite not found"));
        }
        Ok(())
    }

    async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, user_id: Uuid, task: &NewTask) -> Result<Task> {
        let stored = Task {
            id: Uuid::new_v4(),
            title: task.title.clone(),
            description: task.description.clone(),
            progress: task.progress,
            user_id,
            date: task.date,
        };
        self.tasks.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn update_task(&self, user_id: Uuid, task_id: Uuid, update: &UpdateTask) -> Result<Task> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|task| task.id == task_id && task.user_id == user_id)
            .ok_or_else(|| Error::not_found().with_message("task not found"))?;
        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        if let Some(description) = &update.description {
            task.description = Some(description.clone());
        }
        if let Some(progress) = update.progress {
            task.progress = progress;
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|task| !(task.id == task_id && task.user_id == user_id));
        if tasks.len() == before {
            return Err(Error::not_found().with_message("task not found"));
        }
        Ok(())
    }
}

/// In-memory [`InviteSender`] recording sent invites.
#[derive(Default)]
pub struct MockInviteSender {
    sent: Mutex<Vec<NewInvite>>,
    fail_with: Mutex<Option<String>>,
}

impl MockInviteSender {
    /// Creates a sender that accepts every invite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send fail with the given user-facing message.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_owned());
    }

    /// Invites sent so far.
    pub fn sent(&self) -> Vec<NewInvite> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl InviteSender for MockInviteSender {
    async fn send_invite(&self, invite: &NewInvite) -> Result<String> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(Error::external_error().with_message(message));
        }
        self.sent.lock().unwrap().push(invite.clone());
        Ok(format!("Invite sent to {}", invite.email))
    }
}

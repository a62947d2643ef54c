//! Boundary contracts for the external collaborators.
//!
//! The engine never talks to the network itself; it is handed
//! implementations of these traits. `vantage-reqwest` provides the HTTP
//! clients, the `mock` module provides in-memory ones for tests.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;
use vantage_core::{
    Credentials, Invite, NewInvite, NewTask, OrgMembership, OrgUser, Principal, Profile, Result,
    Role, Task, UpdateTask,
};

/// A validated session issued by the external auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Raw bearer token for backend calls.
    pub access_token: String,
    /// When the token stops being honored, if the provider reports it.
    pub expires_at: Option<Timestamp>,
    /// The identity this session authenticates.
    pub principal: Principal,
}

impl AuthSession {
    /// Returns whether the provider still considers this session valid.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Auth state change notification delivered by the provider subscription.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A principal signed in.
    SignedIn(AuthSession),
    /// The current principal signed out.
    SignedOut,
    /// The session token was refreshed.
    TokenRefreshed(AuthSession),
    /// The principal's identity attributes changed.
    UserUpdated(AuthSession),
}

impl AuthEvent {
    /// Returns the session carried by this event, if any.
    pub fn into_session(self) -> Option<AuthSession> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) | Self::UserUpdated(session) => {
                Some(session)
            }
            Self::SignedOut => None,
        }
    }

    /// Returns a short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::UserUpdated(_) => "user_updated",
        }
    }
}

/// The hosted authentication provider, treated as a black box.
///
/// Every call returns a result rather than throwing across the boundary;
/// the engine recovers from provider failures by treating the principal as
/// absent.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Fetches the currently valid session, if one exists.
    async fn get_session(&self) -> Result<Option<AuthSession>>;

    /// Signs in with an email/password pair.
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<AuthSession>;

    /// Registers a new account.
    ///
    /// Returns `None` when the provider requires email confirmation before
    /// issuing a session.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<AuthSession>>;

    /// Signs the current principal out, invalidating the session.
    async fn sign_out(&self) -> Result<()>;

    /// Requests a password-reset email.
    async fn reset_password_for_email(&self, email: &str) -> Result<()>;

    /// Subscribes to auth state change notifications for the lifetime of
    /// the application.
    fn subscribe(&self) -> mpsc::Receiver<AuthEvent>;
}

/// The hosted row store holding RBAC and dashboard data.
///
/// Reads are always filtered by principal or organization id; writes are
/// targeted and only reachable through role-gated paths.
#[async_trait]
pub trait RbacStore: Send + Sync {
    /// Fetches the profile carrying the global role.
    async fn fetch_profile(&self, principal_id: Uuid) -> Result<Option<Profile>>;

    /// Fetches every organization membership the principal holds.
    async fn fetch_memberships(&self, principal_id: Uuid) -> Result<Vec<OrgMembership>>;

    /// Updates a principal's global role. Admin action.
    async fn update_role(&self, principal_id: Uuid, role: Role) -> Result<Profile>;

    /// Lists the members of one organization.
    async fn list_org_users(&self, org_id: Uuid) -> Result<Vec<OrgUser>>;

    /// Lists pending invitations.
    async fn list_invites(&self) -> Result<Vec<Invite>>;

    /// Persists a new invitation row.
    async fn create_invite(&self, invite: &NewInvite) -> Result<Invite>;

    /// Deletes an invitation, revoking the offer.
    async fn delete_invite(&self, invite_id: Uuid) -> Result<()>;

    /// Lists the tasks owned by the principal.
    async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<Task>>;

    /// Creates a task owned by the principal.
    async fn create_task(&self, user_id: Uuid, task: &NewTask) -> Result<Task>;

    /// Updates a task, scoped to the owning principal.
    async fn update_task(&self, user_id: Uuid, task_id: Uuid, update: &UpdateTask) -> Result<Task>;

    /// Deletes a task, scoped to the owning principal.
    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> Result<()>;
}

/// The invite edge function that emails the offer to the invitee.
#[async_trait]
pub trait InviteSender: Send + Sync {
    /// Sends the invitation, returning the provider's confirmation message.
    ///
    /// A non-2xx response surfaces as a user-facing error, never a fatal.
    async fn send_invite(&self, invite: &NewInvite) -> Result<String>;
}

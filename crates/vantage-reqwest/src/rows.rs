//! Row store client implementation using reqwest.
//!
//! Issues filtered reads and targeted writes against the hosted row API:
//! `profiles`, `organization_users`, `invites`, and `tasks`. Every query
//! is scoped by principal or organization id; there are no unscoped
//! writes.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use reqwest::{Client, Method};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;
use vantage_auth::RbacStore;
use vantage_core::{
    Invite, NewInvite, NewTask, OrgMembership, OrgUser, Profile, Role, Task, UpdateTask,
};

use crate::config::BackendConfig;
use crate::error::{Error, check};
use crate::token::TokenCell;

/// Tracing target for row store operations.
pub const TRACING_TARGET_ROWS: &str = "vantage_reqwest::rows";

struct RowsClientInner {
    http: Client,
    config: BackendConfig,
    token: TokenCell,
}

impl std::fmt::Debug for RowsClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowsClientInner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// HTTP client for the hosted row store.
///
/// Implements [`RbacStore`] with one request per operation; the bearer
/// token from the shared [`TokenCell`] scopes every call to the signed-in
/// principal's authority.
#[derive(Clone, Debug)]
pub struct RowsClient {
    inner: Arc<RowsClientInner>,
}

impl RowsClient {
    /// Creates a new row store client with the given configuration.
    pub fn new(config: BackendConfig, token: TokenCell) -> vantage_core::Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            inner: Arc::new(RowsClientInner {
                http,
                config,
                token,
            }),
        })
    }

    fn table(&self, name: &str) -> Url {
        self.inner.config.endpoint(&format!("rest/v1/{name}"))
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let bearer = self
            .inner
            .token
            .get()
            .unwrap_or_else(|| self.inner.config.api_key.clone());
        self.inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.config.api_key)
            .bearer_auth(bearer)
    }

    async fn select<T>(&self, url: Url) -> vantage_core::Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(Error::from)?;
        let rows = check(response).await?.json().await.map_err(Error::from)?;
        Ok(rows)
    }
}

/// Profile row as the backend returns it; `role` may be null.
#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: Uuid,
    role: Option<Role>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ProfileRow {
    fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            role: self.role.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Membership row with the organization name embedded.
#[derive(Debug, Deserialize)]
struct MembershipRow {
    org_id: Uuid,
    role: Option<Role>,
    organizations: Option<OrgNameRow>,
}

#[derive(Debug, Deserialize)]
struct OrgNameRow {
    name: String,
}

impl MembershipRow {
    fn into_membership(self) -> OrgMembership {
        OrgMembership {
            org_id: self.org_id,
            org_name: self
                .organizations
                .map(|org| org.name)
                .unwrap_or_default(),
            role: self.role.unwrap_or_default(),
        }
    }
}

/// Member row with the profile email embedded.
#[derive(Debug, Deserialize)]
struct OrgUserRow {
    user_id: Uuid,
    role: Option<Role>,
    profiles: Option<ProfileEmailRow>,
}

#[derive(Debug, Deserialize)]
struct ProfileEmailRow {
    email: String,
}

impl OrgUserRow {
    fn into_org_user(self) -> OrgUser {
        OrgUser {
            user_id: self.user_id,
            email: self
                .profiles
                .map(|profile| profile.email)
                .unwrap_or_default(),
            role: self.role.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl RbacStore for RowsClient {
    async fn fetch_profile(&self, principal_id: Uuid) -> vantage_core::Result<Option<Profile>> {
        let mut url = self.table("profiles");
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{principal_id}"))
            .append_pair("select", "*");
        let rows: Vec<ProfileRow> = self.select(url).await?;
        Ok(rows.into_iter().next().map(ProfileRow::into_profile))
    }

    async fn fetch_memberships(
        &self,
        principal_id: Uuid,
    ) -> vantage_core::Result<Vec<OrgMembership>> {
        let mut url = self.table("organization_users");
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{principal_id}"))
            .append_pair("select", "org_id,role,organizations(name)");
        let rows: Vec<MembershipRow> = self.select(url).await?;
        Ok(rows.into_iter().map(MembershipRow::into_membership).collect())
    }

    async fn update_role(&self, principal_id: Uuid, role: Role) -> vantage_core::Result<Profile> {
        let mut url = self.table("profiles");
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{principal_id}"));

        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "role": role }))
            .send()
            .await
            .map_err(Error::from)?;
        let rows: Vec<ProfileRow> = check(response).await?.json().await.map_err(Error::from)?;

        tracing::info!(
            target: TRACING_TARGET_ROWS,
            %principal_id,
            %role,
            "global role updated"
        );
        rows.into_iter()
            .next()
            .map(ProfileRow::into_profile)
            .ok_or_else(|| vantage_core::Error::not_found().with_message("profile not found"))
    }

    async fn list_org_users(&self, org_id: Uuid) -> vantage_core::Result<Vec<OrgUser>> {
        let mut url = self.table("organization_users");
        url.query_pairs_mut()
            .append_pair("org_id", &format!("eq.{org_id}"))
            .append_pair("select", "user_id,role,profiles(email)");
        let rows: Vec<OrgUserRow> = self.select(url).await?;
        Ok(rows.into_iter().map(OrgUserRow::into_org_user).collect())
    }

    async fn list_invites(&self) -> vantage_core::Result<Vec<Invite>> {
        let mut url = self.table("invites");
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        self.select(url).await
    }

    async fn create_invite(&self, invite: &NewInvite) -> vantage_core::Result<Invite> {
        let response = self
            .request(Method::POST, self.table("invites"))
            .header("Prefer", "return=representation")
            .json(invite)
            .send()
            .await
            .map_err(Error::from)?;
        let rows: Vec<Invite> = check(response).await?.json().await.map_err(Error::from)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| vantage_core::Error::unknown().with_message("invite row not returned"))
    }

    async fn delete_invite(&self, invite_id: Uuid) -> vantage_core::Result<()> {
        let mut url = self.table("invites");
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{invite_id}"));
        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(Error::from)?;
        check(response).await?;
        Ok(())
    }

    async fn list_tasks(&self, user_id: Uuid) -> vantage_core::Result<Vec<Task>> {
        let mut url = self.table("tasks");
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{user_id}"))
            .append_pair("select", "*")
            .append_pair("order", "date.desc");
        self.select(url).await
    }

    async fn create_task(&self, user_id: Uuid, task: &NewTask) -> vantage_core::Result<Task> {
        let body = serde_json::json!({
            "title": task.title,
            "description": task.description,
            "progress": task.progress,
            "user_id": user_id,
            "date": task.date,
        });
        let response = self
            .request(Method::POST, self.table("tasks"))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(Error::from)?;
        let rows: Vec<Task> = check(response).await?.json().await.map_err(Error::from)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| vantage_core::Error::unknown().with_message("task row not returned"))
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: &UpdateTask,
    ) -> vantage_core::Result<Task> {
        let mut url = self.table("tasks");
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{task_id}"))
            .append_pair("user_id", &format!("eq.{user_id}"));
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await
            .map_err(Error::from)?;
        let rows: Vec<Task> = check(response).await?.json().await.map_err(Error::from)?;
        rows.into_iter().next().ok_or_else(|| {
            vantage_core::Error::not_found().with_message("task not found or not owned by you")
        })
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> vantage_core::Result<()> {
        let mut url = self.table("tasks");
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{task_id}"))
            .append_pair("user_id", &format!("eq.{user_id}"));
        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(Error::from)?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_row_with_null_role_is_unassigned() {
        let json = r#"{
            "id": "8f9b6bb4-6c0c-4ab0-9a55-31a57e16dbd7",
            "role": null,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-02T00:00:00Z"
        }"#;
        let row: ProfileRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.into_profile().role, Role::Unassigned);
    }

    #[test]
    fn test_membership_row_with_embedded_org_name() {
        let json = r#"{
            "org_id": "00000000-0000-0000-0000-000000000007",
            "role": "org_admin",
            "organizations": { "name": "Acme" }
        }"#;
        let row: MembershipRow = serde_json::from_str(json).unwrap();
        let membership = row.into_membership();
        assert_eq!(membership.org_name, "Acme");
        assert_eq!(membership.role, Role::OrgAdmin);
    }

    #[test]
    fn test_membership_row_missing_org_join_degrades() {
        let json = r#"{
            "org_id": "00000000-0000-0000-0000-000000000007",
            "role": "user",
            "organizations": null
        }"#;
        let row: MembershipRow = serde_json::from_str(json).unwrap();
        let membership = row.into_membership();
        assert_eq!(membership.org_name, "");
        assert_eq!(membership.role, Role::User);
    }

    #[test]
    fn test_org_user_row_with_embedded_email() {
        let json = r#"{
            "user_id": "8f9b6bb4-6c0c-4ab0-9a55-31a57e16dbd7",
            "role": "user",
            "profiles": { "email": "member@example.com" }
        }"#;
        let row: OrgUserRow = serde_json::from_str(json).unwrap();
        let user = row.into_org_user();
        assert_eq!(user.email, "member@example.com");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_unknown_role_string_fails_closed() {
        let json = r#"{
            "id": "8f9b6bb4-6c0c-4ab0-9a55-31a57e16dbd7",
            "role": "warlord",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-02T00:00:00Z"
        }"#;
        let row: ProfileRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.into_profile().role, Role::Unassigned);
    }
}

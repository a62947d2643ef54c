//! Invite edge function client implementation using reqwest.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use validator::Validate;
use vantage_auth::InviteSender;
use vantage_core::{Error as CoreError, NewInvite};

use crate::config::BackendConfig;
use crate::error::{Error, check};
use crate::token::TokenCell;

/// Tracing target for invite delivery operations.
pub const TRACING_TARGET_INVITES: &str = "vantage_reqwest::invites";

/// Path of the hosted edge function that emails invitations.
const INVITE_FUNCTION_PATH: &str = "functions/v1/invite-user";

struct InviteFunctionClientInner {
    http: Client,
    config: BackendConfig,
    token: TokenCell,
}

impl std::fmt::Debug for InviteFunctionClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InviteFunctionClientInner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// HTTP client for the invite edge function.
///
/// One POST of `{email, role, org_id}`; a 2xx answer carries a
/// confirmation message, anything else decodes into a user-facing error.
/// Delivery failure is never fatal.
#[derive(Clone, Debug)]
pub struct InviteFunctionClient {
    inner: Arc<InviteFunctionClientInner>,
}

/// Confirmation payload of a successful delivery.
#[derive(Debug, Deserialize)]
struct InviteResponse {
    message: Option<String>,
}

impl InviteFunctionClient {
    /// Creates a new invite function client with the given configuration.
    pub fn new(config: BackendConfig, token: TokenCell) -> vantage_core::Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            inner: Arc::new(InviteFunctionClientInner {
                http,
                config,
                token,
            }),
        })
    }
}

#[async_trait]
impl InviteSender for InviteFunctionClient {
    async fn send_invite(&self, invite: &NewInvite) -> vantage_core::Result<String> {
        invite
            .validate()
            .map_err(|err| CoreError::invalid_input().with_message(err.to_string()))?;

        let bearer = self
            .inner
            .token
            .get()
            .unwrap_or_else(|| self.inner.config.api_key.clone());
        let response = self
            .inner
            .http
            .request(Method::POST, self.inner.config.endpoint(INVITE_FUNCTION_PATH))
            .header("apikey", &self.inner.config.api_key)
            .bearer_auth(bearer)
            .json(invite)
            .send()
            .await
            .map_err(Error::from)?;

        let confirmation: InviteResponse =
            check(response).await?.json().await.map_err(Error::from)?;
        let message = confirmation
            .message
            .unwrap_or_else(|| format!("Invite sent to {}", invite.email));

        tracing::info!(
            target: TRACING_TARGET_INVITES,
            email = %invite.email,
            role = %invite.role,
            "invite delivered"
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use vantage_core::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn test_malformed_email_never_reaches_the_backend() {
        let config = BackendConfig::from_parts("https://backend.example.com", "anon-key").unwrap();
        let client = InviteFunctionClient::new(config, TokenCell::new()).unwrap();
        let invite = NewInvite::org_user("not-an-email", Uuid::new_v4());

        let error = client.send_invite(&invite).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_confirmation_payload_decodes() {
        let payload: InviteResponse =
            serde_json::from_str(r#"{"message": "Invite sent"}"#).unwrap();
        assert_eq!(payload.message.as_deref(), Some("Invite sent"));
    }
}

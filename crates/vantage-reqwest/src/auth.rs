//! Auth provider client implementation using reqwest.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;
use vantage_auth::{AuthEvent, AuthProvider, AuthSession};
use vantage_core::{Credentials, Principal};

use crate::config::BackendConfig;
use crate::error::{Error, check};
use crate::token::TokenCell;

/// Tracing target for auth client operations.
pub const TRACING_TARGET_AUTH: &str = "vantage_reqwest::auth";

struct AuthClientInner {
    http: Client,
    config: BackendConfig,
    token: TokenCell,
    listeners: Mutex<Vec<mpsc::Sender<AuthEvent>>>,
}

impl std::fmt::Debug for AuthClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClientInner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// HTTP client for the hosted auth provider.
///
/// Implements the [`AuthProvider`] trait against the provider's REST
/// surface. The shared [`TokenCell`] is updated on every auth-mutating
/// call, and each change is delivered to subscribers so the authorization
/// engine re-resolves roles exactly once per change.
#[derive(Clone, Debug)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

impl AuthClient {
    /// Creates a new auth client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the config is invalid or the
    /// HTTP client cannot be created.
    pub fn new(config: BackendConfig, token: TokenCell) -> vantage_core::Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET_AUTH,
            base_url = %config.base_url,
            "auth client created"
        );

        Ok(Self {
            inner: Arc::new(AuthClientInner {
                http,
                config,
                token,
                listeners: Mutex::new(Vec::new()),
            }),
        })
    }

    /// The token cell shared with the other backend clients.
    pub fn token_cell(&self) -> &TokenCell {
        &self.inner.token
    }

    fn endpoint(&self, path: &str) -> Url {
        self.inner.config.endpoint(path)
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

    async fn emit(&self, event: AuthEvent) {
        let senders: Vec<_> = {
            let mut listeners = self.inner.listeners.lock().expect("listeners poisoned");
            listeners.retain(|sender| !sender.is_closed());
            listeners.clone()
        };
        for sender in senders {
            let _ = sender.send(event.clone()).await;
        }
    }
}

/// Identity attributes as the provider returns them.
#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: Option<String>,
    email_confirmed_at: Option<Timestamp>,
    created_at: Timestamp,
    last_sign_in_at: Option<Timestamp>,
}

impl UserPayload {
    fn into_principal(self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.unwrap_or_default(),
            email_verified_at: self.email_confirmed_at,
            created_at: self.created_at,
            last_sign_in_at: self.last_sign_in_at,
        }
    }
}

/// Session grant as the provider returns it.
#[derive(Debug, Deserialize)]
struct SessionPayload {
    access_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserPayload,
}

impl SessionPayload {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|seconds| Timestamp::from_second(seconds).ok())
            .or_else(|| {
                self.expires_in.and_then(|seconds| {
                    Timestamp::now()
                        .checked_add(SignedDuration::from_secs(seconds))
                        .ok()
                })
            });
        AuthSession {
            access_token: self.access_token,
            expires_at,
            principal: self.user.into_principal(),
        }
    }
}

/// Sign-up responses carry a session when the provider auto-confirms, and
/// a bare user record when email confirmation is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpPayload {
    Session(SessionPayload),
    User(UserPayload),
}

#[async_trait]
impl AuthProvider for AuthClient {
    async fn get_session(&self) -> vantage_core::Result<Option<AuthSession>> {
        let Some(token) = self.inner.token.get() else {
            return Ok(None);
        };

        let response = self
            .request(Method::GET, self.endpoint("auth/v1/user"))
            .send()
            .await
            .map_err(Error::from)?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            tracing::debug!(
                target: TRACING_TARGET_AUTH,
                "stored token no longer honored, clearing session"
            );
            self.inner.token.clear();
            return Ok(None);
        }

        let user: UserPayload = check(response).await?.json().await.map_err(Error::from)?;
        Ok(Some(AuthSession {
            access_token: token,
            expires_at: None,
            principal: user.into_principal(),
        }))
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> vantage_core::Result<AuthSession> {
        let mut url = self.endpoint("auth/v1/token");
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .request(Method::POST, url)
            .json(credentials)
            .send()
            .await
            .map_err(Error::from)?;
        let payload: SessionPayload = check(response).await?.json().await.map_err(Error::from)?;

        let session = payload.into_session();
        self.inner.token.set(Some(session.access_token.clone()));
        tracing::info!(
            target: TRACING_TARGET_AUTH,
            principal_id = %session.principal.id,
            "signed in"
        );
        self.emit(AuthEvent::SignedIn(session.clone())).await;
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> vantage_core::Result<Option<AuthSession>> {
        let mut url = self.endpoint("auth/v1/signup");
        if let Some(redirect) = self.inner.config.redirect_url("auth/callback") {
            url.query_pairs_mut().append_pair("redirect_to", &redirect);
        }

        let response = self
            .request(Method::POST, url)
            .json(credentials)
            .send()
            .await
            .map_err(Error::from)?;
        let payload: SignUpPayload = check(response).await?.json().await.map_err(Error::from)?;

        match payload {
            SignUpPayload::Session(payload) => {
                let session = payload.into_session();
                self.inner.token.set(Some(session.access_token.clone()));
                self.emit(AuthEvent::SignedIn(session.clone())).await;
                Ok(Some(session))
            }
            SignUpPayload::User(user) => {
                tracing::info!(
                    target: TRACING_TARGET_AUTH,
                    principal_id = %user.id,
                    "sign-up recorded, email confirmation pending"
                );
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> vantage_core::Result<()> {
        let result = self
            .request(Method::POST, self.endpoint("auth/v1/logout"))
            .send()
            .await;

        // The local session is cleared no matter what the provider said.
        self.inner.token.clear();
        self.emit(AuthEvent::SignedOut).await;

        let response = result.map_err(Error::from)?;
        // An already-invalid token still counts as signed out.
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> vantage_core::Result<()> {
        let mut url = self.endpoint("auth/v1/recover");
        if let Some(redirect) = self.inner.config.redirect_url("auth/reset") {
            url.query_pairs_mut().append_pair("redirect_to", &redirect);
        }

        let response = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(Error::from)?;
        check(response).await?;
        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<AuthEvent> {
        let (sender, receiver) = mpsc::channel(16);
        self.inner
            .listeners
            .lock()
            .expect("listeners poisoned")
            .push(sender);
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AuthClient {
        let config = BackendConfig::from_parts("https://backend.example.com", "anon-key").unwrap();
        AuthClient::new(config, TokenCell::new()).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let _ = client();
    }

    #[test]
    fn test_session_payload_decodes_expiry() {
        let json = r#"{
            "access_token": "jwt",
            "expires_at": 1767225600,
            "user": {
                "id": "8f9b6bb4-6c0c-4ab0-9a55-31a57e16dbd7",
                "email": "user@example.com",
                "email_confirmed_at": "2026-01-01T00:00:00Z",
                "created_at": "2025-12-01T00:00:00Z",
                "last_sign_in_at": null
            }
        }"#;
        let payload: SessionPayload = serde_json::from_str(json).unwrap();
        let session = payload.into_session();
        assert_eq!(session.access_token, "jwt");
        assert_eq!(
            session.expires_at,
            Some(Timestamp::from_second(1_767_225_600).unwrap())
        );
        assert_eq!(session.principal.email, "user@example.com");
        assert!(session.principal.is_email_verified());
    }

    #[test]
    fn test_sign_up_payload_without_session_means_confirmation_pending() {
        let json = r#"{
            "id": "8f9b6bb4-6c0c-4ab0-9a55-31a57e16dbd7",
            "email": "user@example.com",
            "email_confirmed_at": null,
            "created_at": "2026-01-01T00:00:00Z",
            "last_sign_in_at": null
        }"#;
        let payload: SignUpPayload = serde_json::from_str(json).unwrap();
        assert!(matches!(payload, SignUpPayload::User(_)));
    }

    #[tokio::test]
    async fn test_subscribers_receive_emitted_events() {
        let client = client();
        let mut events = client.subscribe();
        client.emit(AuthEvent::SignedOut).await;
        assert!(matches!(events.recv().await, Some(AuthEvent::SignedOut)));
    }
}

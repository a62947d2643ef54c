//! Configuration for the backend HTTP clients.

use std::time::Duration;

use url::Url;
use vantage_core::{Error, Result};

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared configuration for every backend collaborator client.
///
/// The backend URL and API key come from the environment and are required
/// at startup; [`BackendConfig::validate`] turns their absence into the
/// fatal configuration error class. The optional site URL is used to build
/// absolute callback links for email verification and password reset.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the hosted backend.
    pub base_url: Url,
    /// Public API key sent with every request.
    pub api_key: String,
    /// Site base URL for email callback links, when deployed.
    pub site_url: Option<Url>,
    /// Default timeout for HTTP requests.
    pub timeout: Duration,
    /// User-Agent header to send with requests.
    pub user_agent: String,
}

impl BackendConfig {
    /// Creates a configuration from the required backend URL and API key.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            site_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: Self::default_user_agent(),
        }
    }

    /// Parses the backend URL and API key from their raw string forms.
    pub fn from_parts(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|err| {
            Error::configuration()
                .with_message("backend URL is not a valid URL")
                .with_source(err)
        })?;
        let config = Self::new(base_url, api_key);
        config.validate()?;
        Ok(config)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("vantage/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the site base URL used for email callback links.
    pub fn with_site_url(mut self, site_url: Url) -> Self {
        self.site_url = Some(site_url);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validates that the required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::configuration().with_message("backend API key must not be empty"));
        }
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(Error::configuration()
                .with_message("backend URL must use the http or https scheme"));
        }
        Ok(())
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Joins a path onto the backend base URL.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            // Url::join would drop existing path segments; extend instead.
            let mut segments = url.path_segments_mut().expect("backend URL is not a base");
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        url
    }

    /// Builds an absolute callback link under the site base URL.
    ///
    /// Returns `None` when no site URL is configured; callers then omit
    /// the redirect and the provider falls back to its own default.
    pub fn redirect_url(&self, path: &str) -> Option<String> {
        let site = self.site_url.as_ref()?;
        let base = site.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Some(format!("{base}/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig::from_parts("https://backend.example.com", "anon-key").unwrap()
    }

    #[test]
    fn test_missing_api_key_is_a_configuration_error() {
        let error = BackendConfig::from_parts("https://backend.example.com", "  ").unwrap_err();
        assert_eq!(error.kind(), vantage_core::ErrorKind::Configuration);
    }

    #[test]
    fn test_malformed_backend_url_is_a_configuration_error() {
        let error = BackendConfig::from_parts("not a url", "anon-key").unwrap_err();
        assert_eq!(error.kind(), vantage_core::ErrorKind::Configuration);
    }

    #[test]
    fn test_endpoint_joins_paths() {
        assert_eq!(
            config().endpoint("auth/v1/token").as_str(),
            "https://backend.example.com/auth/v1/token"
        );
        assert_eq!(
            config().endpoint("/rest/v1/profiles").as_str(),
            "https://backend.example.com/rest/v1/profiles"
        );
    }

    #[test]
    fn test_redirect_url_normalizes_slashes() {
        let config = config().with_site_url(Url::parse("https://app.example.com/").unwrap());
        assert_eq!(
            config.redirect_url("/auth/callback").unwrap(),
            "https://app.example.com/auth/callback"
        );
        assert_eq!(
            config.redirect_url("auth/reset").unwrap(),
            "https://app.example.com/auth/reset"
        );
    }

    #[test]
    fn test_redirect_url_absent_without_site_url() {
        assert_eq!(config().redirect_url("auth/callback"), None);
    }

    #[test]
    fn test_effective_timeout_uses_default_when_zero() {
        let config = config().with_timeout(Duration::ZERO);
        assert_eq!(config.effective_timeout(), DEFAULT_TIMEOUT);
    }
}

//! Internal error types for vantage-reqwest.

use thiserror::Error;

/// Result type alias for vantage-reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for vantage-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The backend answered with a non-2xx status and an error payload.
    #[error("Backend error ({status}): {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// User-facing message decoded from the response body.
        message: String,
    },
}

impl Error {
    /// Creates a backend error from a status code and decoded message.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for vantage_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    vantage_core::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    vantage_core::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else {
                    vantage_core::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => vantage_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Backend { status, message } => match status {
                401 => vantage_core::Error::authentication().with_message(message),
                403 => vantage_core::Error::authorization().with_message(message),
                404 => vantage_core::Error::not_found().with_message(message),
                _ => vantage_core::Error::external_error().with_message(message),
            },
        }
    }
}

/// Error payload shapes the backend answers with.
#[derive(Debug, serde::Deserialize)]
struct ErrorPayload {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ErrorPayload {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Passes 2xx responses through; decodes the error payload otherwise.
pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .ok()
        .and_then(|body| {
            serde_json::from_str::<ErrorPayload>(&body)
                .ok()
                .and_then(ErrorPayload::into_message)
                .or_else(|| (!body.is_empty()).then(|| body.chars().take(256).collect()))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        });
    Err(Error::backend(status.as_u16(), message))
}

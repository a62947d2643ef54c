//! Credential input validation, performed locally before any network call.

use serde::Serialize;
use validator::Validate;
use zxcvbn::{Score, zxcvbn};

use crate::error::{Error, Result};

/// Minimum acceptable password strength score.
///
/// Scores come from the zxcvbn estimator (0 through 4); anything below
/// "safely unguessable" is rejected at the point of input.
pub const MIN_PASSWORD_SCORE: Score = Score::Three;

/// Email/password pair for signing in.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Credentials {
    /// Account email address.
    #[validate(email(message = "email address is not valid"))]
    pub email: String,
    /// Account password.
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Validates the pair, surfacing problems inline as invalid-input errors.
    pub fn validated(self) -> Result<Self> {
        self.validate()
            .map_err(|err| Error::invalid_input().with_message(err.to_string()))?;
        Ok(self)
    }
}

/// Sign-up form input: email, password, and its confirmation.
#[derive(Debug, Clone, Validate)]
pub struct SignUpRequest {
    /// Account email address.
    #[validate(email(message = "email address is not valid"))]
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Confirmation, which must match the password exactly.
    pub password_confirmation: String,
}

impl SignUpRequest {
    /// Creates a sign-up request.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        password_confirmation: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            password_confirmation: password_confirmation.into(),
        }
    }

    /// Validates the whole request: email shape, confirmation match, and
    /// password strength. None of this reaches the backend.
    pub fn validated(self) -> Result<Self> {
        self.validate()
            .map_err(|err| Error::invalid_input().with_message(err.to_string()))?;

        if self.password != self.password_confirmation {
            return Err(Error::invalid_input().with_message("passwords do not match"));
        }

        let estimate = zxcvbn(&self.password, &[&self.email]);
        if estimate.score() < MIN_PASSWORD_SCORE {
            return Err(Error::invalid_input()
                .with_message("password is too weak; pick a longer or less common one"));
        }

        Ok(self)
    }

    /// Consumes the request into the credential pair the auth provider takes.
    pub fn into_credentials(self) -> Credentials {
        Credentials {
            email: self.email,
            password: self.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_mismatched_confirmation_is_invalid_input() {
        let request = SignUpRequest::new("user@example.com", "correct horse battery", "different");
        let error = request.validated().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_weak_password_is_rejected_locally() {
        let request = SignUpRequest::new("user@example.com", "password", "password");
        assert!(request.validated().is_err());
    }

    #[test]
    fn test_strong_password_passes() {
        let password = "halcyon-otter-migrates-9-rivers";
        let request = SignUpRequest::new("user@example.com", password, password);
        assert!(request.validated().is_ok());
    }

    #[test]
    fn test_malformed_email_is_rejected() {
        let creds = Credentials::new("nope", "whatever-password-4");
        assert!(creds.validated().is_err());
    }
}

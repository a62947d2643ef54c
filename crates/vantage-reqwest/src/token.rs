//! Shared session-token cell.

use std::sync::{Arc, RwLock};

/// Holds the current session's bearer token, shared across the backend
/// clients.
///
/// The auth client is the sole writer: it stores a token after a
/// successful sign-in, replaces it on refresh, and clears it on sign-out
/// or when the provider stops honoring it. The row-store and invite
/// clients only read.
#[derive(Clone, Default)]
pub struct TokenCell {
    inner: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for TokenCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let present = self.inner.read().is_ok_and(|token| token.is_some());
        f.debug_struct("TokenCell").field("present", &present).finish()
    }
}

impl TokenCell {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cell seeded with an existing token, e.g. from the
    /// environment.
    pub fn with_token(token: impl Into<String>) -> Self {
        let cell = Self::new();
        cell.set(Some(token.into()));
        cell
    }

    /// Replaces the stored token.
    pub fn set(&self, token: Option<String>) {
        *self.inner.write().expect("token cell poisoned") = token;
    }

    /// Clears the stored token.
    pub fn clear(&self) {
        self.set(None);
    }

    /// Returns the stored token, if any.
    pub fn get(&self) -> Option<String> {
        self.inner.read().expect("token cell poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_lifecycle() {
        let cell = TokenCell::new();
        assert_eq!(cell.get(), None);
        cell.set(Some("token".into()));
        assert_eq!(cell.get().as_deref(), Some("token"));
        cell.clear();
        assert_eq!(cell.get(), None);
    }

    #[test]
    fn test_debug_does_not_leak_the_token() {
        let cell = TokenCell::with_token("secret-token");
        let rendered = format!("{cell:?}");
        assert!(!rendered.contains("secret-token"));
    }
}

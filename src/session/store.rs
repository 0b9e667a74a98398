//! Session store: the single source of truth for "who is logged in".
//!
//! The state machine is `Unauthenticated → Verifying → Authenticated`,
//! with `Verifying → Unauthenticated` on a failed verification and
//! `Authenticated → Unauthenticated` on logout. Session-mutating
//! operations take `&mut self`, so two authentication flows can never
//! run concurrently on the same session.

use serde::{Deserialize, Serialize};

use super::store_file::SessionFile;
use crate::gateway::{GatewayClient, GatewayError};

/// Profile of the signed-in user as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    Verifying,
    Authenticated,
}

/// Internal state. Authenticated always carries both token and user, so
/// the "authenticated iff token and profile present" invariant holds by
/// construction.
#[derive(Debug, Clone)]
enum SessionState {
    Unauthenticated,
    Verifying { token: String },
    Authenticated { token: String, user: UserProfile },
}

/// Result value of a login attempt. A failed login is a value, not an
/// error: callers render the message inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    Failed { message: String },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success)
    }
}

/// Fallback shown when the backend did not supply an error detail
const LOGIN_FALLBACK_MESSAGE: &str = "Unable to sign in, please try again.";

pub struct SessionStore {
    file: SessionFile,
    state: SessionState,
}

impl SessionStore {
    /// Open a session store backed by the given persisted file. The
    /// store starts unauthenticated; call [`restore`](Self::restore) to
    /// pick up a persisted session.
    pub fn new(file: SessionFile) -> Self {
        Self {
            file,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match &self.state {
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
            SessionState::Verifying { .. } => SessionStatus::Verifying,
            SessionState::Authenticated { .. } => SessionStatus::Authenticated,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Unauthenticated => None,
            SessionState::Verifying { token } | SessionState::Authenticated { token, .. } => {
                Some(token)
            }
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Restore a persisted session, verifying the stored token against
    /// the backend.
    ///
    /// Silent recovery: no error is surfaced. A missing token skips
    /// verification entirely; any verification failure clears the
    /// persisted token and leaves the store unauthenticated.
    pub async fn restore(&mut self, gateway: &GatewayClient) {
        let token = match self.file.load_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.state = SessionState::Unauthenticated;
                return;
            }
            Err(error) => {
                tracing::warn!(error = %error, "Failed to read persisted session");
                self.state = SessionState::Unauthenticated;
                return;
            }
        };

        self.state = SessionState::Verifying {
            token: token.clone(),
        };

        match gateway.who_am_i(&token).await {
            Ok(user) => {
                tracing::info!(username = %user.username, "Restored persisted session");
                self.state = SessionState::Authenticated { token, user };
            }
            Err(error) => {
                // Cause does not matter: the stored token is no longer
                // trustworthy, so the only move is a fresh login
                tracing::info!(error = %error, "Persisted session failed verification");
                if let Err(error) = self.file.clear() {
                    tracing::warn!(error = %error, "Failed to clear persisted session");
                }
                self.state = SessionState::Unauthenticated;
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On success the token is persisted and the store becomes
    /// authenticated. On failure the previous state is left untouched
    /// and the outcome carries the backend's message, or a generic
    /// fallback when the backend supplied none.
    pub async fn login(
        &mut self,
        gateway: &GatewayClient,
        username: &str,
        password: &str,
    ) -> LoginOutcome {
        match gateway.authenticate(username, password).await {
            Ok(response) => {
                if let Err(error) = self.file.save_token(&response.access_token) {
                    // The session still works for this process; it just
                    // will not survive a restart
                    tracing::warn!(error = %error, "Failed to persist session token");
                }
                tracing::info!(username = %response.user.username, "Signed in");
                self.state = SessionState::Authenticated {
                    token: response.access_token,
                    user: response.user,
                };
                LoginOutcome::Success
            }
            Err(GatewayError::Rejected { message }) => LoginOutcome::Failed { message },
            Err(error) => {
                tracing::warn!(error = %error, "Login failed without a backend detail");
                LoginOutcome::Failed {
                    message: LOGIN_FALLBACK_MESSAGE.to_string(),
                }
            }
        }
    }

    /// Drop the session, locally only: no backend call is needed for
    /// logout to take effect. Idempotent from any state.
    pub fn logout(&mut self) {
        if let Err(error) = self.file.clear() {
            tracing::warn!(error = %error, "Failed to clear persisted session");
        }
        self.state = SessionState::Unauthenticated;
        tracing::info!("Signed out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockBackend;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(SessionFile::new(dir.path().join("session.json")))
    }

    #[tokio::test]
    async fn test_login_with_valid_credentials_authenticates() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let outcome = store.login(&gateway, "admin", "password").await;
        assert!(outcome.is_success());
        assert_eq!(store.status(), SessionStatus::Authenticated);
        assert_eq!(store.token(), Some(MockBackend::VALID_TOKEN));
        assert_eq!(store.user().unwrap().username, "admin");

        // Token survives in the persisted file
        let file = SessionFile::new(dir.path().join("session.json"));
        assert_eq!(
            file.load_token().unwrap(),
            Some(MockBackend::VALID_TOKEN.to_string())
        );
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials_returns_message() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let outcome = store.login(&gateway, "admin", "wrong").await;
        match outcome {
            LoginOutcome::Failed { message } => {
                assert_eq!(message, "Incorrect username or password");
            }
            LoginOutcome::Success => panic!("login should have failed"),
        }
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
        assert_eq!(store.token(), None);
        assert!(store.user().is_none());
    }

    #[tokio::test]
    async fn test_login_with_unreachable_backend_uses_fallback_message() {
        let gateway = GatewayClient::new("http://127.0.0.1:9", 1, 2).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let outcome = store.login(&gateway, "admin", "password").await;
        match outcome {
            LoginOutcome::Failed { message } => assert!(!message.is_empty()),
            LoginOutcome::Success => panic!("login should have failed"),
        }
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_restore_with_valid_persisted_token() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let file = SessionFile::new(dir.path().join("session.json"));
        file.save_token(MockBackend::VALID_TOKEN).unwrap();

        let mut store = store_in(&dir);
        store.restore(&gateway).await;

        assert_eq!(store.status(), SessionStatus::Authenticated);
        assert_eq!(store.user().unwrap().username, "admin");
    }

    #[tokio::test]
    async fn test_restore_with_stale_token_clears_it() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let file = SessionFile::new(dir.path().join("session.json"));
        file.save_token("expired-token").unwrap();

        let mut store = store_in(&dir);
        store.restore(&gateway).await;

        // Never authenticated with a stale profile, and the bad token is
        // gone from disk
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
        assert!(store.user().is_none());
        assert_eq!(file.load_token().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_without_persisted_token_skips_verification() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store.restore(&gateway).await;
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
        assert_eq!(backend.me_calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_with_unreachable_backend_recovers_silently() {
        let gateway = GatewayClient::new("http://127.0.0.1:9", 1, 2).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let file = SessionFile::new(dir.path().join("session.json"));
        file.save_token("some-token").unwrap();

        let mut store = store_in(&dir);
        store.restore(&gateway).await;
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_from_any_state() {
        let backend = MockBackend::spawn().await;
        let gateway = GatewayClient::new(&backend.base_url, 2, 5).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        // From Unauthenticated
        store.logout();
        assert_eq!(store.status(), SessionStatus::Unauthenticated);

        // From Authenticated, twice in a row
        let outcome = store.login(&gateway, "admin", "password").await;
        assert!(outcome.is_success());
        store.logout();
        store.logout();
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
        assert_eq!(store.token(), None);
        assert!(store.user().is_none());

        let file = SessionFile::new(dir.path().join("session.json"));
        assert_eq!(file.load_token().unwrap(), None);
    }
}

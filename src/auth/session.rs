//! Auth session state
//!
//! `AuthSession` drives the account operations and publishes the result on
//! a watch channel. `AuthHandle` is the read side handed to everything else,
//! plus `invalidate()` for components that see the API reject the session.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use super::AccountApi;
use crate::graphql::{GraphQlError, User};

/// Whether a user is signed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// No `me` answer yet
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Current session state
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            status: AuthStatus::Loading,
            user: None,
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            status: AuthStatus::Authenticated,
            user: Some(user),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}

/// Shared view of the session
#[derive(Debug, Clone)]
pub struct AuthHandle {
    rx: watch::Receiver<AuthState>,
    tx: Arc<watch::Sender<AuthState>>,
}

impl AuthHandle {
    /// A handle not backed by any session, starting at `state`
    pub fn new(state: AuthState) -> Self {
        let (tx, rx) = watch::channel(state);
        Self {
            rx,
            tx: Arc::new(tx),
        }
    }

    pub fn state(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.rx.borrow().user.clone()
    }

    /// Wait for the next state change
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Mark the session as gone
    ///
    /// Called when the API answers UNAUTHENTICATED. Every holder sees the
    /// change, so watches tied to this session stop.
    pub fn invalidate(&self) {
        let changed = self.tx.send_if_modified(|state| {
            if state.status == AuthStatus::Unauthenticated {
                false
            } else {
                *state = AuthState::signed_out();
                true
            }
        });

        if changed {
            tracing::info!("Session invalidated");
        }
    }

    /// Publish a new state to every holder
    pub fn replace(&self, state: AuthState) {
        self.tx.send_replace(state);
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("API error: {0}")]
    Api(#[from] GraphQlError),

    #[error("Signed in but the session could not be confirmed")]
    SessionNotEstablished,
}

/// Session driver
pub struct AuthSession {
    api: Arc<dyn AccountApi>,
    handle: AuthHandle,
}

impl AuthSession {
    /// Create a session in the `Loading` state
    pub fn new(api: Arc<dyn AccountApi>) -> Self {
        Self {
            api,
            handle: AuthHandle::new(AuthState::loading()),
        }
    }

    /// Handle to inject into session-dependent components
    pub fn handle(&self) -> AuthHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> AuthState {
        self.handle.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.handle.is_authenticated()
    }

    /// Ask the API who is signed in
    ///
    /// Any failure counts as signed out.
    pub async fn refresh(&self) -> AuthState {
        let state = match self.api.me().await {
            Ok(Some(user)) => AuthState::signed_in(user),
            Ok(None) => AuthState::signed_out(),
            Err(e) => {
                tracing::debug!(error = %e, "Session check failed");
                AuthState::signed_out()
            }
        };

        self.handle.replace(state.clone());
        state
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        self.api.login(email, password).await?;
        self.confirm().await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        let email = email.trim();
        let display_name = display_name.trim();
        if email.is_empty() || password.is_empty() || display_name.is_empty() {
            return Err(AuthError::Validation(
                "Email, password and display name are required".to_string(),
            ));
        }

        self.api.register(email, password, display_name).await?;
        self.confirm().await
    }

    /// Sign out; the local session ends even if the API call fails
    pub async fn logout(&self) -> Result<(), AuthError> {
        let result = self.api.logout().await;
        self.handle.replace(AuthState::signed_out());
        result.map(|_| ()).map_err(AuthError::from)
    }

    /// Change the display name and update the cached user
    pub async fn update_display_name(&self, display_name: &str) -> Result<User, AuthError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::Validation(
                "Display name cannot be empty".to_string(),
            ));
        }

        match self.api.update_display_name(display_name).await {
            Ok(user) => {
                self.handle.replace(AuthState::signed_in(user.clone()));
                Ok(user)
            }
            Err(e) => {
                if e.is_unauthenticated() {
                    self.handle.invalidate();
                }
                Err(e.into())
            }
        }
    }

    async fn confirm(&self) -> Result<User, AuthError> {
        match self.refresh().await.user {
            Some(user) => {
                tracing::info!(user_id = %user.id, "Signed in");
                Ok(user)
            }
            None => Err(AuthError::SessionNotEstablished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::{GraphQlResult, UserSettings};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Accepts one fixed password and keeps a signed-in flag
    struct FakeAccounts {
        signed_in: AtomicBool,
        fail_logout: bool,
    }

    impl FakeAccounts {
        fn new() -> Self {
            Self {
                signed_in: AtomicBool::new(false),
                fail_logout: false,
            }
        }

        fn user() -> User {
            User {
                id: "u1".to_string(),
                email: Some("ada@example.com".to_string()),
                created_at: None,
                display_name: Some("Ada".to_string()),
            }
        }
    }

    #[async_trait]
    impl AccountApi for FakeAccounts {
        async fn me(&self) -> GraphQlResult<Option<User>> {
            Ok(self.signed_in.load(Ordering::SeqCst).then(Self::user))
        }

        async fn login(&self, _email: &str, password: &str) -> GraphQlResult<()> {
            if password == "secret" {
                self.signed_in.store(true, Ordering::SeqCst);
                Ok(())
            } else {
                Err(GraphQlError::GraphQl {
                    message: "Invalid credentials".to_string(),
                    code: None,
                })
            }
        }

        async fn register(&self, _: &str, _: &str, _: &str) -> GraphQlResult<()> {
            self.signed_in.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn logout(&self) -> GraphQlResult<bool> {
            self.signed_in.store(false, Ordering::SeqCst);
            if self.fail_logout {
                Err(GraphQlError::Unavailable)
            } else {
                Ok(true)
            }
        }

        async fn update_display_name(&self, display_name: &str) -> GraphQlResult<User> {
            if !self.signed_in.load(Ordering::SeqCst) {
                return Err(GraphQlError::Unauthenticated);
            }
            Ok(User {
                display_name: Some(display_name.to_string()),
                ..Self::user()
            })
        }

        async fn update_user_settings(&self, tz: &str, hour: u8) -> GraphQlResult<UserSettings> {
            Ok(UserSettings {
                id: "u1".to_string(),
                timezone: tz.to_string(),
                day_rollover_hour: hour,
            })
        }
    }

    #[tokio::test]
    async fn test_refresh_signed_out() {
        let session = AuthSession::new(Arc::new(FakeAccounts::new()));
        assert_eq!(session.state().status, AuthStatus::Loading);

        let state = session.refresh().await;
        assert_eq!(state.status, AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_login_and_handle_sees_change() {
        let session = AuthSession::new(Arc::new(FakeAccounts::new()));
        let mut handle = session.handle();

        let user = session.login("ada@example.com", "secret").await.unwrap();
        assert_eq!(user.id, "u1");
        assert!(handle.changed().await);
        assert!(handle.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let session = AuthSession::new(Arc::new(FakeAccounts::new()));
        let err = session.login("ada@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::Api(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let session = AuthSession::new(Arc::new(FakeAccounts::new()));
        let err = session.login("  ", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_logout_always_signs_out() {
        let api = FakeAccounts {
            signed_in: AtomicBool::new(true),
            fail_logout: true,
        };
        let session = AuthSession::new(Arc::new(api));
        session.refresh().await;
        assert!(session.is_authenticated());

        assert!(session.logout().await.is_err());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_invalidate_reaches_all_handles() {
        let session = AuthSession::new(Arc::new(FakeAccounts::new()));
        session.register("ada@example.com", "pw", "Ada").await.unwrap();

        let first = session.handle();
        let mut second = session.handle();
        first.invalidate();

        assert!(second.changed().await);
        assert!(!second.is_authenticated());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_update_display_name_updates_cached_user() {
        let session = AuthSession::new(Arc::new(FakeAccounts::new()));
        session.login("ada@example.com", "secret").await.unwrap();

        let user = session.update_display_name("  Countess  ").await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Countess"));
        assert_eq!(
            session.state().user.and_then(|u| u.display_name).as_deref(),
            Some("Countess")
        );
    }
}

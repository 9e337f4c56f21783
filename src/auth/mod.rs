//! Authentication
//!
//! Session state for the signed-in user. The session is process-wide but
//! never looked up globally: components that care about it receive an
//! [`AuthHandle`] and react to its changes.

mod session;

pub use session::{AuthError, AuthHandle, AuthSession, AuthState, AuthStatus};

use async_trait::async_trait;

use crate::graphql::{GraphQlResult, User, UserSettings};

/// Account operations offered by the API
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// The signed-in user, if the session is valid
    async fn me(&self) -> GraphQlResult<Option<User>>;

    async fn login(&self, email: &str, password: &str) -> GraphQlResult<()>;

    async fn register(&self, email: &str, password: &str, display_name: &str) -> GraphQlResult<()>;

    async fn logout(&self) -> GraphQlResult<bool>;

    async fn update_display_name(&self, display_name: &str) -> GraphQlResult<User>;

    async fn update_user_settings(
        &self,
        timezone: &str,
        day_rollover_hour: u8,
    ) -> GraphQlResult<UserSettings>;
}

//! Session management for authentication

use async_trait::async_trait;
use time::Duration;
use tower_sessions::{Expiry, Session};
use tracing::{debug, warn};

use super::types::{CurrentUser, UserId};
use super::{SessionContext, UserStore};
use crate::error::Result;

/// Session configuration re-export
pub use super::store::SessionConfig;

/// Session keys used for storing data
pub struct SessionKeys;

impl SessionKeys {
    pub const USER_ID: &'static str = "user_id";
    pub const LOGGED_IN_AT: &'static str = "logged_in_at";
}

/// [`SessionContext`] backed by a tower-sessions [`Session`].
///
/// The session layer writes the cookie when the response leaves the stack;
/// this type only mutates the session record.
#[derive(Debug, Clone)]
pub struct TowerSessionContext {
    session: Session,
    current: CurrentUser,
    remember_for: Duration,
}

impl TowerSessionContext {
    pub fn new(session: Session, current: CurrentUser) -> Self {
        Self {
            session,
            current,
            remember_for: Duration::days(14),
        }
    }

    /// How long a remembered login survives without activity.
    #[must_use]
    pub fn with_remember_for(mut self, remember_for: Duration) -> Self {
        self.remember_for = remember_for;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_current_user(self) -> CurrentUser {
        self.current
    }
}

#[async_trait]
impl SessionContext for TowerSessionContext {
    async fn destroy_current_session(&mut self) -> Result<()> {
        self.session.flush().await?;
        debug!("Session destroyed");
        Ok(())
    }

    async fn clear_auth_cookie(&mut self) -> Result<()> {
        self.session.remove_value(SessionKeys::USER_ID).await?;
        self.session.remove_value(SessionKeys::LOGGED_IN_AT).await?;
        Ok(())
    }

    fn set_current_user(&mut self, user: CurrentUser) {
        self.current = user;
    }

    fn current_user(&self) -> &CurrentUser {
        &self.current
    }

    async fn set_auth_cookie(&mut self, user_id: UserId, remember: bool) -> Result<()> {
        let expiry = if remember {
            Expiry::OnInactivity(self.remember_for)
        } else {
            Expiry::OnSessionEnd
        };
        self.session.set_expiry(Some(expiry));

        self.session.cycle_id().await?;
        self.session.insert(SessionKeys::USER_ID, user_id).await?;
        self.session
            .insert(SessionKeys::LOGGED_IN_AT, chrono::Utc::now())
            .await?;
        self.session.save().await?;

        debug!("Auth session issued for user {}", user_id);
        Ok(())
    }
}

/// The user id stored in the session, if any.
pub async fn session_user_id(session: &Session) -> Result<Option<UserId>> {
    Ok(session.get::<UserId>(SessionKeys::USER_ID).await?)
}

/// Resolve the session's user against the store.
///
/// A session pointing at a user the store no longer knows is treated as
/// anonymous.
pub async fn resolve_current_user(session: &Session, users: &dyn UserStore) -> Result<CurrentUser> {
    let Some(user_id) = session_user_id(session).await? else {
        return Ok(CurrentUser::Anonymous);
    };

    match users.load_user(user_id).await? {
        Some(user) => Ok(CurrentUser::User(user)),
        None => {
            warn!("Session refers to unknown user {}", user_id);
            Ok(CurrentUser::Anonymous)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryUserStore;
    use crate::auth::types::NewUser;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_set_auth_cookie_and_resolve() {
        let users = MemoryUserStore::new();
        let id = users
            .create_user(NewUser {
                login: "q0w1e2".to_string(),
                password: "aaaaaaaaaaaaaaaa".to_string(),
                role: "subscriber".to_string(),
                locale: "en_US".to_string(),
                show_admin_bar_front: false,
            })
            .await
            .unwrap();

        let session = new_session();
        let mut ctx = TowerSessionContext::new(session.clone(), CurrentUser::Anonymous);
        ctx.set_auth_cookie(id, false).await.unwrap();

        assert_eq!(session_user_id(&session).await.unwrap(), Some(id));
        assert_eq!(session.expiry(), Some(Expiry::OnSessionEnd));

        let current = resolve_current_user(&session, &users).await.unwrap();
        assert_eq!(current.user_id(), Some(id));
    }

    #[tokio::test]
    async fn test_remembered_login_uses_inactivity_expiry() {
        let session = new_session();
        let mut ctx = TowerSessionContext::new(session.clone(), CurrentUser::Anonymous)
            .with_remember_for(Duration::days(3));
        ctx.set_auth_cookie(5, true).await.unwrap();

        assert_eq!(
            session.expiry(),
            Some(Expiry::OnInactivity(Duration::days(3)))
        );
    }

    #[tokio::test]
    async fn test_destroy_and_clear() {
        let session = new_session();
        let mut ctx = TowerSessionContext::new(session.clone(), CurrentUser::Anonymous);
        ctx.set_auth_cookie(9, false).await.unwrap();

        ctx.clear_auth_cookie().await.unwrap();
        assert_eq!(session_user_id(&session).await.unwrap(), None);

        ctx.set_auth_cookie(9, false).await.unwrap();
        ctx.destroy_current_session().await.unwrap();
        assert_eq!(session_user_id(&session).await.unwrap(), None);
        assert!(session.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_session_user_is_anonymous() {
        let users = MemoryUserStore::new();
        let session = new_session();
        session.insert(SessionKeys::USER_ID, 404_i64).await.unwrap();

        let current = resolve_current_user(&session, &users).await.unwrap();
        assert_eq!(current, CurrentUser::Anonymous);
    }
}

//! Authentication module for magic link registration
//!
//! This module provides:
//! - The [`UserStore`] and [`SessionContext`] seams the registration flow runs against
//! - Session handling on top of tower-sessions
//! - Login notification hooks
//! - The magic link gate and registration flow itself

pub mod hooks;
pub mod magic_link;
pub mod memory;
pub mod session;
pub mod store;
pub mod types;

use async_trait::async_trait;

pub use hooks::{LoginHooks, LoginListener, TracingLoginListener};
pub use magic_link::{GateOutcome, MagicLink, TOKEN_PARAM};
pub use memory::MemoryUserStore;
pub use session::{SessionConfig, TowerSessionContext};
pub use store::SqlxSessionStore;
pub use types::{CurrentUser, NewUser, ProvisionedUser, UserId};

use crate::error::Result;

/// Persistent user records.
///
/// `create_user` must enforce uniqueness of `login`; a duplicate is reported
/// as an error, never silently merged.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Insert a new user and return its identifier.
    async fn create_user(&self, user: NewUser) -> Result<UserId>;

    /// Load a user by identifier. `Ok(None)` means no such user.
    async fn load_user(&self, id: UserId) -> Result<Option<ProvisionedUser>>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Per-request authentication context.
///
/// Mirrors the primitives a host session subsystem exposes: tearing down the
/// current session, clearing and issuing the auth cookie, and switching the
/// identity the rest of the request runs as.
#[async_trait]
pub trait SessionContext: Send {
    /// Destroy the current session and everything stored in it.
    async fn destroy_current_session(&mut self) -> Result<()>;

    /// Remove the authentication marker from the session cookie.
    async fn clear_auth_cookie(&mut self) -> Result<()>;

    /// Switch the identity for the remainder of the request.
    fn set_current_user(&mut self, user: CurrentUser);

    /// The identity the request currently runs as.
    fn current_user(&self) -> &CurrentUser;

    /// Issue an authenticated session cookie for `user_id`.
    ///
    /// With `remember` unset the cookie expires with the browser session.
    async fn set_auth_cookie(&mut self, user_id: UserId, remember: bool) -> Result<()>;
}

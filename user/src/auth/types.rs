//! Authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identifier assigned by the user store.
pub type UserId = i64;

/// A user record to be created.
///
/// Debug output hides the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub login: String,
    pub password: String,
    pub role: String,
    pub locale: String,
    pub show_admin_bar_front: bool,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("locale", &self.locale)
            .field("show_admin_bar_front", &self.show_admin_bar_front)
            .finish()
    }
}

/// A user as stored, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProvisionedUser {
    pub id: UserId,
    pub login: String,
    pub role: String,
    pub locale: String,
    pub show_admin_bar_front: bool,
    pub created_at: DateTime<Utc>,
}

/// The identity the current request acts as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CurrentUser {
    /// A logged-in user
    User(ProvisionedUser),
    /// No one is logged in
    #[default]
    Anonymous,
}

impl CurrentUser {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, CurrentUser::User(_))
    }

    pub fn user(&self) -> Option<&ProvisionedUser> {
        match self {
            CurrentUser::User(user) => Some(user),
            CurrentUser::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }
}

/// Serializable view of the current user, returned by `/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub authenticated: bool,
    pub user: Option<ProvisionedUser>,
}

impl From<&CurrentUser> for CurrentUserResponse {
    fn from(current: &CurrentUser) -> Self {
        Self {
            authenticated: current.is_authenticated(),
            user: current.user().cloned(),
        }
    }
}

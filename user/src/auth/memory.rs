//! In-process user store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::types::{NewUser, ProvisionedUser, UserId};
use super::UserStore;
use crate::error::{Result, UserError};

#[derive(Debug, Default)]
struct Inner {
    next_id: UserId,
    users: BTreeMap<UserId, (ProvisionedUser, String)>,
}

/// A [`UserStore`] kept in memory, with the same login uniqueness rule as
/// the SQLite store. Passwords are kept as given.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All users, ordered by identifier.
    pub async fn users(&self) -> Vec<ProvisionedUser> {
        self.inner
            .read()
            .await
            .users
            .values()
            .map(|(user, _)| user.clone())
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserId> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|(u, _)| u.login == user.login) {
            return Err(UserError::Provisioning(format!(
                "login {} already exists",
                user.login
            )));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let record = ProvisionedUser {
            id,
            login: user.login,
            role: user.role,
            locale: user.locale,
            show_admin_bar_front: user.show_admin_bar_front,
            created_at: Utc::now(),
        };
        inner.users.insert(id, (record, user.password));

        Ok(id)
    }

    async fn load_user(&self, id: UserId) -> Result<Option<ProvisionedUser>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .get(&id)
            .map(|(user, _)| user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(login: &str) -> NewUser {
        NewUser {
            login: login.to_string(),
            password: "00112233aabbccdd".to_string(),
            role: "subscriber".to_string(),
            locale: "en_US".to_string(),
            show_admin_bar_front: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let store = MemoryUserStore::new();
        let id = store.create_user(new_user("abc")).await.unwrap();
        assert_eq!(id, 1);

        let user = store.load_user(id).await.unwrap().unwrap();
        assert_eq!(user.login, "abc");
        assert!(store.load_user(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_login_rejected() {
        let store = MemoryUserStore::new();
        store.create_user(new_user("abc")).await.unwrap();
        assert!(store.create_user(new_user("abc")).await.is_err());
        assert_eq!(store.len().await, 1);
    }
}

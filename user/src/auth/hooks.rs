//! Login notification hooks

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::types::ProvisionedUser;

/// Listener notified after a user has been logged in.
#[async_trait]
pub trait LoginListener: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn on_login(&self, login: &str, user: &ProvisionedUser);
}

/// Ordered list of login listeners, invoked one after another.
#[derive(Clone, Default)]
pub struct LoginHooks {
    listeners: Vec<Arc<dyn LoginListener>>,
}

impl LoginHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; listeners run in registration order.
    pub fn register(&mut self, listener: Arc<dyn LoginListener>) {
        self.listeners.push(listener);
    }

    #[must_use]
    pub fn with(mut self, listener: Arc<dyn LoginListener>) -> Self {
        self.register(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub async fn notify(&self, user: &ProvisionedUser) {
        for listener in &self.listeners {
            listener.on_login(&user.login, user).await;
        }
    }
}

impl std::fmt::Debug for LoginHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|l| l.name()))
            .finish()
    }
}

/// Logs every login at info level.
#[derive(Debug, Default)]
pub struct TracingLoginListener;

#[async_trait]
impl LoginListener for TracingLoginListener {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn on_login(&self, login: &str, user: &ProvisionedUser) {
        info!(user_id = user.id, role = %user.role, "User {} logged in", login);
    }
}

//! Magic link registration
//!
//! A request carrying the shared token creates a fresh account, logs it in
//! and is redirected onward. Every failure ends on the same page with the
//! token removed, so a visitor cannot tell why an attempt did not work.

use rand::Rng;
use settings::{shared_secret, ProvisioningDefaults, RedirectPolicy, SettingsProvider};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::hooks::LoginHooks;
use super::types::{CurrentUser, NewUser, ProvisionedUser, UserId};
use super::{SessionContext, UserStore};
use crate::error::{Result, UserError};

/// Request parameter carrying the magic link token
pub const TOKEN_PARAM: &str = "arotp";

/// How a request leaves the token gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// No token on the request; continue as usual
    PassThrough,
    /// Wrong token or failed registration; redirect to the stripped URL
    StripRedirect(String),
    /// Registration succeeded; redirect per the redirect policy
    PolicyRedirect(String),
}

impl GateOutcome {
    /// Redirect location, if the outcome ends the request.
    pub fn location(&self) -> Option<&str> {
        match self {
            GateOutcome::PassThrough => None,
            GateOutcome::StripRedirect(url) | GateOutcome::PolicyRedirect(url) => Some(url),
        }
    }
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['+', '%']) {
        return Cow::Borrowed(raw);
    }
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Owned(spaced),
    }
}

/// Decode an `application/x-www-form-urlencoded` string into ordered pairs.
pub fn parse_params(encoded: &str) -> Vec<(String, String)> {
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (
                decode_component(key).into_owned(),
                decode_component(value).into_owned(),
            )
        })
        .collect()
}

fn last_token(encoded: &str) -> Option<String> {
    parse_params(encoded)
        .into_iter()
        .filter(|(key, _)| key == TOKEN_PARAM)
        .last()
        .map(|(_, value)| value)
}

/// Find the token among the request parameters.
///
/// A form body value takes precedence over the query string, and within
/// either source the last occurrence wins.
pub fn extract_token(query: Option<&str>, form: Option<&str>) -> Option<String> {
    form.and_then(last_token)
        .or_else(|| query.and_then(last_token))
}

/// Exact comparison of the supplied token against the configured secret.
///
/// An unset secret matches nothing.
pub fn check_token(supplied: &str, secret: Option<&str>) -> bool {
    secret.is_some_and(|secret| secret.as_bytes() == supplied.as_bytes())
}

/// 16 hex characters from 8 random bytes
pub fn generate_password() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Lowercase base-36 rendering of `value`.
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Random login: base-36 of a random integer in `0..=i64::MAX`
pub fn generate_login() -> String {
    let value = rand::thread_rng().gen_range(0..=i64::MAX as u64);
    to_base36(value)
}

/// The request URL with every token pair removed from the query.
pub fn strip_token(path: &str, query: Option<&str>) -> String {
    let trimmed = path.trim_start_matches('/');
    let mut url = format!("/{}", trimmed);

    let kept: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            decode_component(key) != TOKEN_PARAM
        })
        .collect();

    if !kept.is_empty() {
        url.push('?');
        url.push_str(&kept.join("&"));
    }
    url
}

/// Whether `target` can be handed to a browser as a redirect.
///
/// Accepts absolute http(s) URLs with a host and origin-relative paths.
pub fn is_safe_target(target: &str) -> bool {
    if target.is_empty() || target.chars().any(|c| c.is_control() || c.is_whitespace() || c == '\\') {
        return false;
    }

    if let Some(rest) = target.strip_prefix('/') {
        return !rest.starts_with('/');
    }

    let lower = target.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !host.starts_with('@')
        }
        None => false,
    }
}

/// Where a successful registration sends the visitor.
pub fn redirect_destination(policy: &RedirectPolicy, stripped: &str) -> String {
    match policy.target() {
        Some(target) if is_safe_target(target) => target.to_string(),
        Some(target) => {
            warn!("Ignoring unsafe redirect target {:?}", target);
            stripped.to_string()
        }
        None => stripped.to_string(),
    }
}

/// The token gate and registration flow.
pub struct MagicLink {
    settings: Arc<dyn SettingsProvider>,
    users: Arc<dyn UserStore>,
    login_hooks: LoginHooks,
    remember: bool,
}

impl MagicLink {
    pub fn new(settings: Arc<dyn SettingsProvider>, users: Arc<dyn UserStore>) -> Self {
        Self {
            settings,
            users,
            login_hooks: LoginHooks::new(),
            remember: false,
        }
    }

    #[must_use]
    pub fn with_login_hooks(mut self, hooks: LoginHooks) -> Self {
        self.login_hooks = hooks;
        self
    }

    /// Issue remembered sessions instead of browser-session cookies.
    #[must_use]
    pub fn with_remember(mut self, remember: bool) -> Self {
        self.remember = remember;
        self
    }

    pub fn settings(&self) -> &Arc<dyn SettingsProvider> {
        &self.settings
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Compare `supplied` against the configured secret.
    pub fn check_token(&self, supplied: &str) -> bool {
        check_token(supplied, shared_secret(self.settings.as_ref()).as_deref())
    }

    /// Create a new user with random credentials and the configured defaults.
    pub async fn provision_user(&self) -> Result<UserId> {
        let defaults = ProvisioningDefaults::load(self.settings.as_ref());
        let new_user = NewUser {
            login: generate_login(),
            password: generate_password(),
            role: defaults.role,
            locale: defaults.locale,
            show_admin_bar_front: false,
        };
        debug!(?new_user, "Provisioning user");

        let login = new_user.login.clone();
        let id = self.users.create_user(new_user).await?;
        info!("Provisioned user {} with id {}", login, id);
        Ok(id)
    }

    /// Replace whatever session the request had with one for `user_id`.
    pub async fn establish_session<C>(&self, ctx: &mut C, user_id: UserId) -> Result<ProvisionedUser>
    where
        C: SessionContext + ?Sized,
    {
        ctx.destroy_current_session().await?;
        ctx.clear_auth_cookie().await?;
        ctx.set_current_user(CurrentUser::Anonymous);

        let user = self
            .users
            .load_user(user_id)
            .await?
            .ok_or_else(|| UserError::UserNotFound(user_id.to_string()))?;

        ctx.set_auth_cookie(user.id, self.remember).await?;
        self.login_hooks.notify(&user).await;
        ctx.set_current_user(CurrentUser::User(user.clone()));

        Ok(user)
    }

    /// Run the whole gate for one request.
    pub async fn redeem<C>(
        &self,
        token: Option<&str>,
        ctx: &mut C,
        path: &str,
        query: Option<&str>,
    ) -> GateOutcome
    where
        C: SessionContext + ?Sized,
    {
        let Some(token) = token else {
            return GateOutcome::PassThrough;
        };
        let stripped = strip_token(path, query);

        if !self.check_token(token) {
            warn!("Magic link token mismatch on {}", path);
            return GateOutcome::StripRedirect(stripped);
        }

        let user_id = match self.provision_user().await {
            Ok(id) => id,
            Err(e) => {
                error!("User provisioning failed: {}", e);
                return GateOutcome::StripRedirect(stripped);
            }
        };

        match self.establish_session(ctx, user_id).await {
            Ok(_) => {
                let policy = RedirectPolicy::load(self.settings.as_ref());
                GateOutcome::PolicyRedirect(redirect_destination(&policy, &stripped))
            }
            Err(e) => {
                warn!("Session establishment failed for user {}: {}", user_id, e);
                GateOutcome::StripRedirect(stripped)
            }
        }
    }
}

impl std::fmt::Debug for MagicLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagicLink")
            .field("login_hooks", &self.login_hooks)
            .field("remember", &self.remember)
            .finish_non_exhaustive()
    }
}

//! Request lifecycle hooks
//!
//! Every request passes through an ordered list of [`RequestHook`]s before it
//! reaches a handler. A hook either hands the (possibly modified) request to
//! the next hook or ends the request with its own response.

use async_trait::async_trait;
use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LOCATION},
        HeaderValue, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::sync::Arc;
use time::Duration;
use tower_sessions::Session;
use tracing::{debug, error, warn};
use user::auth::magic_link::{extract_token, strip_token};
use user::auth::session::resolve_current_user;
use user::{CurrentUser, MagicLink, TowerSessionContext, UserStore};

use crate::AppState;

/// Largest form body the token gate will buffer.
pub const FORM_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// What a hook decided about a request.
pub enum HookFlow {
    /// Hand the request to the next hook, or to the router after the last one
    Continue(Request<Body>),
    /// End the request with this response
    Respond(Response),
}

#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn on_request(&self, request: Request<Body>) -> HookFlow;
}

/// Ordered list of request hooks.
#[derive(Clone, Default)]
pub struct RequestHooks {
    hooks: Vec<Arc<dyn RequestHook>>,
}

impl RequestHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn RequestHook>) {
        self.hooks.push(hook);
    }

    #[must_use]
    pub fn with(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.register(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Run the hooks in order, stopping at the first one that responds.
    pub async fn run(&self, mut request: Request<Body>) -> HookFlow {
        for hook in &self.hooks {
            match hook.on_request(request).await {
                HookFlow::Continue(next) => request = next,
                HookFlow::Respond(response) => {
                    debug!("Request hook {} ended the request", hook.name());
                    return HookFlow::Respond(response);
                }
            }
        }
        HookFlow::Continue(request)
    }
}

impl std::fmt::Debug for RequestHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The token gate followed by the current-user loader.
pub fn default_chain(
    magic_link: Arc<MagicLink>,
    users: Arc<dyn UserStore>,
    remember_for: Duration,
) -> RequestHooks {
    RequestHooks::new()
        .with(Arc::new(
            MagicLinkGate::new(magic_link).with_remember_for(remember_for),
        ))
        .with(Arc::new(CurrentUserLoader::new(users)))
}

/// Middleware dispatching every request through the state's hook chain.
pub async fn run_request_hooks(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match state.request_hooks.run(request).await {
        HookFlow::Continue(request) => next.run(request).await,
        HookFlow::Respond(response) => response,
    }
}

/// `302 Found` to `location`, never cached.
pub fn redirect_response(location: &str) -> Response {
    let location = HeaderValue::from_str(location).unwrap_or_else(|_| {
        warn!("Redirect location is not a valid header value, using /");
        HeaderValue::from_static("/")
    });

    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(LOCATION, location);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn is_form(request: &Request<Body>) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

/// Body length known before reading: `Content-Length`, else an exact size hint.
fn known_length(request: &Request<Body>) -> Option<u64> {
    request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| request.body().size_hint().exact())
}

enum FormRead {
    Buffered(Request<Body>, String),
    /// The stream failed part way; the body is gone
    Unreadable(Request<Body>),
    TooLarge,
}

/// Read a form body and rebuild the request around the same bytes.
async fn buffer_form(request: Request<Body>, limit: usize) -> FormRead {
    let (mut parts, body) = request.into_parts();
    match Limited::new(body, limit).collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let form = String::from_utf8_lossy(&bytes).into_owned();
            FormRead::Buffered(Request::from_parts(parts, Body::from(bytes)), form)
        }
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Form body exceeded its declared length");
            FormRead::TooLarge
        }
        Err(e) => {
            warn!("Could not read form body: {}", e);
            parts.headers.remove(CONTENT_LENGTH);
            FormRead::Unreadable(Request::from_parts(parts, Body::empty()))
        }
    }
}

/// Redeems the magic link token on any request that carries one.
pub struct MagicLinkGate {
    magic_link: Arc<MagicLink>,
    remember_for: Duration,
    body_limit: usize,
}

impl MagicLinkGate {
    pub fn new(magic_link: Arc<MagicLink>) -> Self {
        Self {
            magic_link,
            remember_for: Duration::days(14),
            body_limit: FORM_BODY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_remember_for(mut self, remember_for: Duration) -> Self {
        self.remember_for = remember_for;
        self
    }

    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

#[async_trait]
impl RequestHook for MagicLinkGate {
    fn name(&self) -> &'static str {
        "magic_link_gate"
    }

    async fn on_request(&self, request: Request<Body>) -> HookFlow {
        let path = request.uri().path().to_string();
        let query = request.uri().query().map(str::to_string);

        // Forms of unknown or excessive length are left alone; only the query is checked
        let readable = is_form(&request)
            && known_length(&request).is_some_and(|len| len <= self.body_limit as u64);

        let (request, form) = if readable {
            match buffer_form(request, self.body_limit).await {
                FormRead::Buffered(request, form) => (request, Some(form)),
                FormRead::Unreadable(request) => (request, None),
                FormRead::TooLarge => {
                    return HookFlow::Respond(StatusCode::PAYLOAD_TOO_LARGE.into_response())
                }
            }
        } else {
            (request, None)
        };

        let Some(token) = extract_token(query.as_deref(), form.as_deref()) else {
            return HookFlow::Continue(request);
        };

        let Some(session) = request.extensions().get::<Session>().cloned() else {
            error!("Magic link token received without a session layer");
            return HookFlow::Respond(redirect_response(&strip_token(&path, query.as_deref())));
        };
        let current = request
            .extensions()
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default();

        let mut ctx = TowerSessionContext::new(session, current).with_remember_for(self.remember_for);
        let outcome = self
            .magic_link
            .redeem(Some(token.as_str()), &mut ctx, &path, query.as_deref())
            .await;

        match outcome.location() {
            Some(location) => HookFlow::Respond(redirect_response(location)),
            None => HookFlow::Continue(request),
        }
    }
}

/// Resolves the session's user and stores it as a [`CurrentUser`] extension.
pub struct CurrentUserLoader {
    users: Arc<dyn UserStore>,
}

impl CurrentUserLoader {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl RequestHook for CurrentUserLoader {
    fn name(&self) -> &'static str {
        "current_user_loader"
    }

    async fn on_request(&self, mut request: Request<Body>) -> HookFlow {
        let current = match request.extensions().get::<Session>().cloned() {
            Some(session) => match resolve_current_user(&session, self.users.as_ref()).await {
                Ok(current) => current,
                Err(e) => {
                    warn!("Could not load current user: {}", e);
                    CurrentUser::Anonymous
                }
            },
            None => CurrentUser::Anonymous,
        };

        request.extensions_mut().insert(current);
        HookFlow::Continue(request)
    }
}

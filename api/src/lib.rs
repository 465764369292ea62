use axum::{middleware, routing::get, Router};
use settings::SettingsProvider;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use user::{LoginHooks, MagicLink, SessionConfig, TracingLoginListener, UserStore};
use utoipa::OpenApi;

pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;


pub use middleware_hooks::{HookFlow, RequestHook, RequestHooks};
// Re-export server functions for convenience
pub use server::{spawn_server_with_config, start_server_with_config, ApiConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub magic_link: Arc<MagicLink>,
    pub request_hooks: Arc<RequestHooks>,
}

impl AppState {
    /// Wire the magic link flow and the default request hook chain.
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        users: Arc<dyn UserStore>,
        session: &SessionConfig,
    ) -> Self {
        let login_hooks = LoginHooks::new().with(Arc::new(TracingLoginListener));
        let magic_link = Arc::new(
            MagicLink::new(settings, users.clone())
                .with_login_hooks(login_hooks)
                .with_remember(session.remember_login),
        );
        let request_hooks = Arc::new(middleware_hooks::default_chain(
            magic_link.clone(),
            users.clone(),
            session.remember_for(),
        ));

        Self {
            users,
            magic_link,
            request_hooks,
        }
    }

    /// Replace the request hook chain.
    #[must_use]
    pub fn with_request_hooks(mut self, hooks: RequestHooks) -> Self {
        self.request_hooks = Arc::new(hooks);
        self
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health::health_check, handlers::page::current_user),
    components(schemas(
        models::HealthResponse,
        models::DatabaseHealth,
        models::MeResponse,
        models::UserSummary,
        error::ApiErrorResponse,
        error::ErrorDetail,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Current session"),
    ),
    info(
        title = "Auto Register",
        version = "1.0.1",
        description = "Magic link registration host",
    ),
)]
pub struct ApiDoc;

/// Create the router with all routes and middleware.
///
/// The request hooks run inside the session layer so every hook sees the
/// request's [`tower_sessions::Session`], and they wrap the fallback as well
/// as the routes, so the token gate sees every path.
pub fn create_router<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/", get(handlers::page::home))
        .route("/me", get(handlers::page::current_user))
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(handlers::health::openapi_json))
        .fallback(handlers::page::home)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::run_request_hooks,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(session_layer),
        )
        .with_state(state)
}

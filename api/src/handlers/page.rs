//! Host pages the token gate sits in front of

use axum::{
    http::Uri,
    response::{Html, IntoResponse},
    Extension, Json,
};
use user::CurrentUser;

use crate::{
    error::{ApiError, ApiErrorResponse, ApiResult},
    models::MeResponse,
};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Greeting page for `/` and every unmatched path.
pub async fn home(uri: Uri, current: Option<Extension<CurrentUser>>) -> Html<String> {
    let greeting = match current.as_ref().and_then(|Extension(c)| c.user()) {
        Some(user) => format!(
            "Welcome, <strong>{}</strong> ({})",
            escape(&user.login),
            escape(&user.role)
        ),
        None => "Welcome, visitor".to_string(),
    };

    Html(format!(
        "<!doctype html>\n<html><head><title>Auto Register</title></head>\
         <body><h1>{}</h1><p>{}</p></body></html>\n",
        greeting,
        escape(uri.path())
    ))
}

/// Current session user
///
/// GET /me
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Identity of the current session", body = MeResponse),
        (status = 500, description = "Request hooks not installed", body = ApiErrorResponse)
    ),
    tag = "session"
)]
pub async fn current_user(
    current: Option<Extension<CurrentUser>>,
) -> ApiResult<impl IntoResponse> {
    let Some(Extension(current)) = current else {
        return Err(ApiError::InternalError(
            "current user was not loaded for this request".to_string(),
        ));
    };

    Ok(Json(MeResponse::from(&current)))
}

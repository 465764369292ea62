use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use tracing::info;
use utoipa::OpenApi;

use crate::{
    error::ApiResult,
    models::{DatabaseHealth, HealthResponse},
    ApiDoc, AppState,
};

/// Health check endpoint
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("Health check requested");

    let db_health = match state.users.ping().await {
        Ok(()) => DatabaseHealth {
            connected: true,
            message: "User store reachable".to_string(),
        },
        Err(e) => DatabaseHealth {
            connected: false,
            message: format!("User store unreachable: {}", e),
        },
    };

    let response = HealthResponse {
        status: if db_health.connected {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        database: db_health,
    };

    Ok(Json(response))
}

/// GET /openapi.json
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use user::{CurrentUser, ProvisionedUser};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}

/// Public view of a provisioned user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub login: String,
    pub role: String,
    pub locale: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ProvisionedUser> for UserSummary {
    fn from(user: &ProvisionedUser) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            role: user.role.clone(),
            locale: user.locale.clone(),
            created_at: user.created_at,
        }
    }
}

/// Response for `GET /me`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub authenticated: bool,
    pub user: Option<UserSummary>,
}

impl From<&CurrentUser> for MeResponse {
    fn from(current: &CurrentUser) -> Self {
        Self {
            authenticated: current.is_authenticated(),
            user: current.user().map(UserSummary::from),
        }
    }
}

use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Error,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Health {
    status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<HealthStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_cache: Option<HealthStatus>,
}

impl HealthStatus {
    fn from_check(healthy: bool) -> Self {
        if healthy {
            Self::Ok
        } else {
            Self::Error
        }
    }
}

impl IntoResponse for Health {
    fn into_response(self) -> Response {
        let status_code = match self.status {
            HealthStatus::Ok => StatusCode::OK,
            HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status_code, Json(self)).into_response()
    }
}

/// Liveness check, answers as long as the process serves requests
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is alive", body = Health)
    )
)]
async fn health_check() -> Health {
    Health {
        status: HealthStatus::Ok,
        database: None,
        key_cache: None,
    }
}

/// Readiness check, verifies the drinks store and the signing key cache
#[utoipa::path(
    get,
    path = "/ready",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is ready", body = Health),
        (status = 503, description = "Store or key cache is not usable", body = Health)
    )
)]
async fn ready_check(State(state): State<AppState>) -> Health {
    let (database, key_cache) = tokio::join!(state.store_healthy(), state.key_cache_healthy());
    Health {
        status: HealthStatus::from_check(database && key_cache),
        database: Some(HealthStatus::from_check(database)),
        key_cache: Some(HealthStatus::from_check(key_cache)),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
}

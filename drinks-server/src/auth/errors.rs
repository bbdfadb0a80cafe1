use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Reasons a request was refused by the permission gate
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingHeader,
    #[error("{0}")]
    InvalidHeader(String),
    #[error("Token expired.")]
    TokenExpired,
    #[error("{0}")]
    InvalidClaims(String),
    #[error("Permissions not included in JWT.")]
    MissingScopeClaim,
    #[error("Permission '{0}' not found.")]
    InsufficientScope(String),
    #[error("Unable to fetch the signing key set.")]
    KeySetUnavailable,
}

impl AuthError {
    pub fn invalid_header(description: impl Into<String>) -> Self {
        Self::InvalidHeader(description.into())
    }

    pub fn invalid_claims(description: impl Into<String>) -> Self {
        Self::InvalidClaims(description.into())
    }

    /// Short machine readable code sent as `message`
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "authorization_header_missing",
            Self::InvalidHeader(_) => "invalid_header",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims(_) | Self::MissingScopeClaim => "invalid_claims",
            Self::InsufficientScope(_) => "insufficient_scope",
            Self::KeySetUnavailable => "jwks_unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InsufficientScope(_) => StatusCode::FORBIDDEN,
            Self::KeySetUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Body returned for refused requests
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthErrorBody {
    pub description: String,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = AuthErrorBody {
            description: self.to_string(),
            message: self.code().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MissingHeader.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::MissingScopeClaim.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InsufficientScope("post:drinks".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::KeySetUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_response_body() {
        let response = AuthError::invalid_header("Unable to find the appropriate key.").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: AuthErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, "invalid_header");
        assert_eq!(body.description, "Unable to find the appropriate key.");
    }
}

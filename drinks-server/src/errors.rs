use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Failure of a drinks endpoint, rendered as `{"success": false, "error", "message"}`
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest,
    NotFound,
    MethodNotAllowed,
    Unprocessable,
    ServerError,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Invalid request",
            Self::NotFound => "resource not found",
            Self::MethodNotAllowed => "method not allowed",
            Self::Unprocessable => "unprocessable",
            Self::ServerError => "Server error",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        let body = ErrorBody {
            success: false,
            error: status_code.as_u16(),
            message: self.message().to_string(),
        };
        (status_code, Json(body)).into_response()
    }
}

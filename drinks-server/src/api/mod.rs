pub(crate) mod drinks;
pub(crate) mod health;

use crate::errors::ApiError;
use crate::state::AppState;
use axum::Router;
use http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(drinks::router(state))
        // unknown paths answer in the same JSON shape as handler errors
        .fallback(not_found)
}

/// Browser clients may call the API from any origin
pub(super) fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestFixture;
    use axum::body::Body;
    use http::{Method, Request, StatusCode};

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let fixture = TestFixture::new().await;
        fixture
            .get("/coffee", None)
            .await
            .assert_api_error(StatusCode::NOT_FOUND, "resource not found");
    }

    #[tokio::test]
    async fn test_cors_headers_on_response() {
        let fixture = TestFixture::new().await;
        let request = Request::builder()
            .uri("/health")
            .header("Origin", "http://localhost:8100")
            .body(Body::empty())
            .unwrap();

        let response = fixture.send(request).await;
        response.assert_ok();
        assert_eq!(response.headers["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_cors_preflight_for_protected_route() {
        let fixture = TestFixture::new().await;
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/drinks-detail")
            .header("Origin", "http://localhost:8100")
            .header("Access-Control-Request-Method", "GET")
            .header("Access-Control-Request-Headers", "authorization")
            .body(Body::empty())
            .unwrap();

        let response = fixture.send(request).await;
        response.assert_ok();
        assert_eq!(response.headers["access-control-allow-origin"], "*");
        let allowed = response.headers["access-control-allow-methods"]
            .to_str()
            .unwrap();
        assert!(allowed.contains("PATCH"));
        assert!(allowed.contains("DELETE"));
    }
}

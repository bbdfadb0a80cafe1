use crate::config::AppConfig;
use crate::create_app;
use crate::models::{Ingredient, NewDrink, Recipe};
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

pub const TEST_KID: &str = "coffee-test-key";
pub const TEST_AUDIENCE: &str = "coffeeshop";
pub const TEST_ISSUER: &str = "https://coffee.test.auth0.com/";
pub const TEST_SUBJECT: &str = "auth0|barista";

/// Every scope the drinks API knows about
pub const ALL_SCOPES: [&str; 4] = [
    "get:drinks-detail",
    "post:drinks",
    "patch:drinks",
    "delete:drinks",
];

const PRIMARY_KEY_PEM: &str = include_str!("../test-data/primary_rsa.pem");
const ROGUE_KEY_PEM: &str = include_str!("../test-data/rogue_rsa.pem");

// base64url modulus of PRIMARY_KEY_PEM, exponent is 65537
const PRIMARY_KEY_MODULUS: &str = "tDq_q29d_WzkLxYapmdMFz5WTNlAdgrAxRYpqXanktFmC4vnl4_DASKyCGotsTsl6RrZES5oeUrPevoCbiEmCdGcCF1GhUb3mTKiaeoJN8PrcLFkuBMWmKnGRVoScmLKeCvF3Zr_0SSgKk4Uzw_pqwnIDPtG2v-3xJaiq-Q-KivyEpoy8tG9u0v51pjdUd-08lh2h4EQ8mVTbo8SJkYwVlHp7jX8wOgWwnHBJiDprjcoKsj2THJFOi2PE0D1sXQzYr5PAtcInSK6Zl2JBL1XF0XMVfOTUXFK1AvrdAvswtdf1DZDMJJDbSq239yk-LUCGL-KJDSBrM5l-LiDtw2Amw";

/// Key used to sign test tokens. Only `Primary` is published in the mocked key set.
#[derive(Debug, Clone, Copy)]
pub enum SigningKey {
    Primary,
    Rogue,
}

impl SigningKey {
    fn pem(self) -> &'static str {
        match self {
            Self::Primary => PRIMARY_KEY_PEM,
            Self::Rogue => ROGUE_KEY_PEM,
        }
    }
}

/// Key set document publishing the primary test key
pub fn jwks_body() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": TEST_KID,
            "n": PRIMARY_KEY_MODULUS,
            "e": "AQAB"
        }]
    })
}

/// Serves [`jwks_body`] at `/.well-known/jwks.json`
pub async fn mount_jwks(server: &MockServer) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .mount(server)
        .await;
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_secs()
}

/// Claims the test identity provider would issue, valid for an hour
pub fn claims_with_scopes(scopes: &[&str]) -> Value {
    let now = now();
    json!({
        "sub": TEST_SUBJECT,
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "iat": now,
        "exp": now + 3600,
        "scope": scopes.join(" "),
    })
}

/// Signs `claims` with RS256
pub fn mint_token(claims: &Value, kid: Option<&str>, key: SigningKey) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let encoding_key =
        EncodingKey::from_rsa_pem(key.pem().as_bytes()).expect("Test key is a valid RSA key");
    jsonwebtoken::encode(&header, claims, &encoding_key).expect("Failed to sign test token")
}

/// A valid token granting `scopes`
pub fn token_with_scopes(scopes: &[&str]) -> String {
    mint_token(&claims_with_scopes(scopes), Some(TEST_KID), SigningKey::Primary)
}

/// Recipe with a single ingredient
pub fn recipe(name: &str, color: &str, parts: u32) -> Recipe {
    Recipe(vec![Ingredient {
        name: name.to_string(),
        color: color.to_string(),
        parts,
    }])
}

/// Test fixture for exercising the full router against an in-memory store and a mocked key set.
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     fixture.seed("latte", recipe("milk", "white", 3)).await;
///
///     let token = token_with_scopes(&["get:drinks-detail"]);
///     let response = fixture.get("/drinks-detail", Some(&token)).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration the state was built from
    pub config: AppConfig,
    /// Mock identity provider serving the key set
    pub jwks_mock: MockServer,
    /// Shared state, for seeding and inspecting the store
    pub state: AppState,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let jwks_mock = MockServer::start().await;
        mount_jwks(&jwks_mock).await;

        let config = AppConfig::for_test_with_mocks(&jwks_mock);
        let state = AppState::new(config.clone())
            .await
            .expect("Failed to build test state");
        let app = create_app(state.clone()).await;

        Self {
            app,
            config,
            jwks_mock,
            state,
        }
    }

    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Inserts a drink straight into the store and returns its id
    pub async fn seed(&self, title: &str, recipe: Recipe) -> i64 {
        self.state
            .store
            .insert(&NewDrink {
                title: title.to_string(),
                recipe,
            })
            .await
            .expect("Failed to seed drink")
            .id
    }

    /// Request builder with JSON content type and, if given, a bearer token
    pub fn request_builder(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        token: Option<&str>,
    ) -> http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder
    }

    pub async fn get(&self, uri: impl AsRef<str>, token: Option<&str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri, token)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        self.send_json(Method::POST, uri, body, token).await
    }

    pub async fn patch<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        self.send_json(Method::PATCH, uri, body, token).await
    }

    pub async fn delete(&self, uri: impl AsRef<str>, token: Option<&str>) -> TestResponse {
        let request = self
            .request_builder(Method::DELETE, uri, token)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(method, uri, token)
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a request and collects the status, headers and JSON body
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Non-JSON and empty bodies become an empty object
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| json!({}))
        } else {
            json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }
}

/// Response from a test request
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Asserts the `{"success": false, "error", "message"}` shape
    pub fn assert_api_error(&self, expected: StatusCode, message: &str) -> &Self {
        self.assert_status(expected);
        assert_eq!(
            self.json,
            json!({
                "success": false,
                "error": expected.as_u16(),
                "message": message,
            })
        );
        self
    }

    /// Asserts a refusal from the permission gate with the given code
    pub fn assert_auth_error(&self, expected: StatusCode, code: &str) -> &Self {
        self.assert_status(expected);
        assert_eq!(self.json["message"], json!(code), "body: {}", self.json);
        assert!(self.json["description"].is_string());
        self
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}

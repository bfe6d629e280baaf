//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /api/auth/register - Register a new account and get a token
//! - POST /api/auth/login - Login and get a token
//! - POST /api/auth/logout - Acknowledge logout (tokens are stateless)
//! - GET /api/auth/me - Get the principal behind the bearer token

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::core::auth::validator::Principal;
use crate::core::auth::{AuthError, AuthResponse, AuthService, LoginRequest, RegisterRequest};

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Convert AuthError to API response.
///
/// Token failures collapse into one generic 401, and unknown users look the
/// same as wrong passwords, so responses reveal neither which check failed nor
/// which usernames exist.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::DuplicateUsername => {
                (StatusCode::CONFLICT, "USERNAME_EXISTS", self.to_string())
            }
            AuthError::DuplicateEmail => (StatusCode::CONFLICT, "EMAIL_EXISTS", self.to_string()),
            AuthError::UserNotFound | AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                AuthError::InvalidCredentials.to_string(),
            ),
            AuthError::MissingToken
            | AuthError::TokenDecryptionFailure
            | AuthError::TokenSignatureInvalid
            | AuthError::TokenExpired
            | AuthError::PrincipalMismatch => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized".to_string(),
            ),
            AuthError::InsufficientRole => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden".to_string())
            }
            AuthError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", self.to_string())
            }
            AuthError::InternalError(detail) => {
                tracing::error!("Auth internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ApiError::new(message, code))).into_response()
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::InvalidRequest(rejection.body_text())
    }
}

/// Response for logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(me_handler))
        .with_state(state)
}

/// POST /api/auth/register
/// Register a new account
async fn register_handler(
    State(state): State<Arc<AuthApiState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(request) = body?;
    tracing::info!("Registration attempt for username: {}", request.username);

    let response = state.auth_service.register(request).await?;

    tracing::info!(
        "Account registered: {} ({})",
        response.account.username,
        response.account.role
    );

    Ok(Json(response))
}

/// POST /api/auth/login
/// Login and get a new token
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(request) = body?;
    tracing::info!("Login attempt for username: {}", request.username);

    let username = request.username.clone();
    let response = state.auth_service.login(request).await.inspect_err(|e| {
        tracing::warn!("Login failed for {}: {}", username, e);
    })?;

    tracing::info!("Account logged in: {}", response.account.username);

    Ok(Json(response))
}

/// POST /api/auth/logout
/// Nothing to invalidate server-side; the client discards its token
async fn logout_handler() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Logout successful.".to_string(),
    })
}

/// GET /api/auth/me
/// Return the principal behind the bearer token
async fn me_handler(principal: Principal) -> Json<Principal> {
    Json(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::password::BcryptHasher;
    use crate::core::config::TokenSecrets;
    use crate::core::db::repositories::InMemoryCredentialStore;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let secrets =
            TokenSecrets::new("test_secret_key_for_testing_only_32bytes!", "encryptor-password")
                .unwrap();
        let auth_service = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(BcryptHasher::new(4)),
            &secrets,
        );

        auth_api_router(AuthApiState { auth_service })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn register(app: &Router, username: &str, password: &str, role: &str) -> Value {
        let (status, body) = send(
            app,
            post_json(
                "/api/auth/register",
                json!({"username": username, "password": password, "role": role}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[tokio::test]
    async fn test_register_and_me() {
        let app = app();

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/register",
                json!({"username": "alice", "password": "pw1", "email": "a@x.com", "role": "USER"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "USER");
        assert_eq!(body["email"], "a@x.com");
        assert!(body["id"].is_i64());
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me) = send(&app, get_with_token("/api/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me, json!({"username": "alice", "role": "USER"}));
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let app = app();
        register(&app, "alice", "pw1", "USER").await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/register",
                json!({"username": "alice", "password": "pw2"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "USERNAME_EXISTS");
    }

    #[tokio::test]
    async fn test_register_blank_password_is_bad_request() {
        let app = app();

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/register",
                json!({"username": "alice", "password": ""}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_register_missing_field_is_bad_request() {
        let app = app();

        let (status, body) = send(
            &app,
            post_json("/api/auth/register", json!({"username": "alice"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
        assert!(body["error"].as_str().unwrap().contains("password"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .body(Body::from(r#"{"username":"a","password":"b"}"#))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_login_success() {
        let app = app();
        register(&app, "root", "pw2", "admin").await;

        let (status, body) = send(
            &app,
            post_json("/api/auth/login", json!({"username": "root", "password": "pw2"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "ADMIN");
        assert!(body["token"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = app();
        register(&app, "alice", "pw1", "USER").await;

        let (wrong_status, wrong_body) = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({"username": "alice", "password": "wrongpw"}),
            ),
        )
        .await;
        let (ghost_status, ghost_body) = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({"username": "ghost", "password": "anything"}),
            ),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(ghost_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, ghost_body);
        assert!(wrong_body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_me_without_token() {
        let app = app();

        let (status, body) = send(&app, get_with_token("/api/auth/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_me_with_garbage_token() {
        let app = app();

        let (status, body) = send(&app, get_with_token("/api/auth/me", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_logout_is_stateless() {
        let app = app();
        let body = register(&app, "alice", "pw1", "USER").await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, post_json("/api/auth/logout", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Logout successful.");

        // The token keeps working until it expires
        let (status, _) = send(&app, get_with_token("/api/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response = AuthError::InternalError("db password is hunter2".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::DuplicateUsername, StatusCode::CONFLICT),
            (AuthError::DuplicateEmail, StatusCode::CONFLICT),
            (AuthError::UserNotFound, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::MissingToken, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::PrincipalMismatch, StatusCode::UNAUTHORIZED),
            (AuthError::InsufficientRole, StatusCode::FORBIDDEN),
            (
                AuthError::InvalidRequest("x".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("Unauthorized", "UNAUTHORIZED");
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains(r#""error":"Unauthorized""#));
        assert!(json.contains(r#""code":"UNAUTHORIZED""#));
    }
}

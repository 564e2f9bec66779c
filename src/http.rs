//! HTTP boundary.
//!
//! JSON endpoints over [`AuthService`], a transport-neutral `/dialogue` hook
//! for chat hosts, `/metrics` for Prometheus scraping and `/health`.

use crate::db::{NewUser, Role, UserSummary};
use crate::dialogue::{DialogueEngine, RawInput};
use crate::services::auth::{LoginResult, LogoutResult, RegisterResult, SessionResult};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DialogueEngine>,
    pub name: Arc<str>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub identity: i64,
    pub name: String,
    pub surname: String,
    pub birthdate: NaiveDate,
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct DialogueRequest {
    pub identity: i64,
    pub input: RawInput,
    #[serde(default)]
    pub token: Option<String>,
}

/// Build the router. Split from [`run_http_server`] so tests can drive it
/// without a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/validate", post(validate_handler))
        .route("/logout", post(logout_handler))
        .route("/dialogue", post(dialogue_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve the router on `addr` until the listener fails.
pub async fn run_http_server(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, router(state)).await
}

fn error(status: StatusCode, code: &str, message: impl std::fmt::Display) -> Response {
    (
        status,
        Json(json!({ "error": code, "message": message.to_string() })),
    )
        .into_response()
}

fn unavailable() -> Response {
    error(
        StatusCode::SERVICE_UNAVAILABLE,
        "storage",
        crate::error::SERVICE_UNAVAILABLE,
    )
}

fn profile_json(profile: &UserSummary) -> serde_json::Value {
    json!({
        "identity": profile.identity,
        "name": profile.name,
        "surname": profile.surname,
        "role": profile.role,
    })
}

async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let password = Zeroizing::new(req.password);
    if req.role == Role::Admin {
        return error(
            StatusCode::BAD_REQUEST,
            "validation",
            "role must be follower or leader",
        );
    }
    let user = NewUser {
        identity: req.identity,
        name: req.name,
        surname: req.surname,
        birthdate: req.birthdate,
        username: req.username,
        role: req.role,
    };

    match state.engine.auth().register(user, &password).await {
        RegisterResult::Created => {
            (StatusCode::CREATED, Json(json!({ "status": "created" }))).into_response()
        }
        RegisterResult::AlreadyRegistered => error(
            StatusCode::CONFLICT,
            "identity_registered",
            "identity already registered",
        ),
        RegisterResult::UsernameTaken => error(
            StatusCode::CONFLICT,
            "username_taken",
            "username already in use",
        ),
        RegisterResult::Rejected(e) => error(StatusCode::BAD_REQUEST, "validation", e),
        RegisterResult::StorageFailure => unavailable(),
    }
}

async fn login_handler(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    let password = Zeroizing::new(req.password);
    match state.engine.auth().login(&req.username, &password).await {
        LoginResult::Authenticated(auth) => {
            let mut body = profile_json(&auth.profile);
            body["token"] = json!(auth.token);
            (StatusCode::OK, Json(body)).into_response()
        }
        LoginResult::InvalidCredentials => error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        ),
        LoginResult::StorageFailure => unavailable(),
    }
}

async fn validate_handler(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Response {
    match state.engine.auth().validate_session(&req.token).await {
        SessionResult::Active(profile) => {
            (StatusCode::OK, Json(profile_json(&profile))).into_response()
        }
        SessionResult::Invalid => error(
            StatusCode::UNAUTHORIZED,
            "session_invalid",
            "session expired or unknown",
        ),
        SessionResult::StorageFailure => unavailable(),
    }
}

async fn logout_handler(State(state): State<AppState>, Json(req): Json<TokenRequest>) -> Response {
    match state.engine.auth().logout(&req.token).await {
        LogoutResult::Revoked => {
            (StatusCode::OK, Json(json!({ "status": "logged_out" }))).into_response()
        }
        LogoutResult::NotFound => error(StatusCode::NOT_FOUND, "session_not_found", "no such session"),
        LogoutResult::StorageFailure => unavailable(),
    }
}

async fn dialogue_handler(
    State(state): State<AppState>,
    Json(req): Json<DialogueRequest>,
) -> Response {
    let event = match state.engine.decode(req.identity, req.input, req.token) {
        Ok(event) => event,
        Err(e) => return error(StatusCode::BAD_REQUEST, "decode", e),
    };
    let effects = state.engine.handle(req.identity, event).await;
    (StatusCode::OK, Json(json!({ "effects": effects }))).into_response()
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": &*state.name,
        "active_dialogues": state.engine.active(),
    }))
}

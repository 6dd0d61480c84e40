//! Authentication endpoint handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::{error, SharedState};

/// POST /auth
pub async fn login(state: SharedState, body: Value) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut state = state.write().await;
    let Some((token, refresh, user_id)) = state.login(username, password) else {
        return error(
            StatusCode::BAD_REQUEST,
            "Username or password does not matches user.",
        );
    };

    let mut user = state.get("users", user_id).cloned().unwrap_or_else(|| json!({}));
    user["auth_token"] = token.into();
    user["refresh"] = refresh.into();
    (StatusCode::OK, Json(user)).into_response()
}

/// POST /auth/refresh
pub async fn refresh(state: SharedState, body: Value) -> Response {
    let refresh = body["refresh"].as_str().unwrap_or_default();

    let mut state = state.write().await;
    match state.refresh(refresh) {
        Some((token, refresh)) => (
            StatusCode::OK,
            Json(json!({ "auth_token": token, "refresh": refresh })),
        )
            .into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Token is invalid or expired"),
    }
}

/// GET /users/me
pub async fn me(state: SharedState, token: Option<String>) -> Response {
    let state = state.read().await;
    let user = token
        .as_deref()
        .and_then(|t| state.user_for_token(t))
        .and_then(|id| state.get("users", id));

    match user {
        Some(user) => (StatusCode::OK, Json(user.clone())).into_response(),
        None => error(
            StatusCode::UNAUTHORIZED,
            "Authentication credentials were not provided.",
        ),
    }
}

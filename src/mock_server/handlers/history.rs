//! History and comment handlers.

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{error, parse_id, SharedState};

/// GET /history/{entity}/{id}
pub async fn get(state: SharedState, entity: &str, id: &str) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let state = state.read().await;
    let entries = state
        .history
        .get(&(entity.to_string(), id))
        .cloned()
        .unwrap_or_default();
    (StatusCode::OK, Json(entries)).into_response()
}

/// POST /history/{entity}/{id}/delete_comment and `undelete_comment`
pub async fn comment_action(
    state: SharedState,
    entity: &str,
    id: &str,
    action: &str,
    query: HashMap<String, String>,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let deleted = match action {
        "delete_comment" => true,
        "undelete_comment" => false,
        _ => return error(StatusCode::NOT_FOUND, "Not found."),
    };
    let Some(comment_id) = query.get("id") else {
        return error(StatusCode::BAD_REQUEST, "id is required.");
    };

    let mut state = state.write().await;
    if state.set_comment_deleted(entity, id, comment_id, deleted) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, "Comment not found.")
    }
}

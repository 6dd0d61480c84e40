//! Search and importer handlers.

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::{error, parse_id, SharedState};
use crate::models::kinds;

/// Endpoint and the field matched against the search text, per result group.
const SEARCH_GROUPS: &[(&str, &str, &str)] = &[
    ("tasks", "tasks", "subject"),
    ("issues", "issues", "subject"),
    ("userstories", "userstories", "subject"),
    ("wikipages", "wiki", "slug"),
    ("epics", "epics", "subject"),
];

/// GET /search?project={id}&text={text}
///
/// Case-insensitive substring match on each kind's subject (or slug for wiki
/// pages).
pub async fn search(state: SharedState, query: HashMap<String, String>) -> Response {
    let Some(project) = query.get("project") else {
        return error(StatusCode::BAD_REQUEST, "project is required.");
    };
    let text = query
        .get("text")
        .map(|t| t.to_lowercase())
        .unwrap_or_default();

    let mut filters = HashMap::new();
    filters.insert("project".to_string(), project.clone());

    let state = state.read().await;
    let mut body = json!({});
    let mut count = 0;
    for (group, endpoint, field) in SEARCH_GROUPS {
        let matches: Vec<Value> = state
            .list(endpoint, &filters)
            .into_iter()
            .filter(|object| {
                object[*field]
                    .as_str()
                    .is_some_and(|value| value.to_lowercase().contains(&text))
            })
            .collect();
        count += matches.len();
        body[*group] = Value::Array(matches);
    }
    body["count"] = count.into();

    (StatusCode::OK, Json(body)).into_response()
}

/// POST /importer/{project}/{type}
///
/// Stores the object as given, keeping any `ref` or dates it carries.
pub async fn import(state: SharedState, project: &str, import_type: &str, body: Value) -> Response {
    let project = match parse_id(project) {
        Ok(project) => project,
        Err(response) => return response,
    };
    let Some(kind) = kinds::ALL
        .iter()
        .copied()
        .find(|kind| kind.import_type == Some(import_type))
    else {
        return error(StatusCode::NOT_FOUND, "Not found.");
    };
    let Value::Object(mut fields) = body else {
        return error(StatusCode::BAD_REQUEST, "Invalid JSON body.");
    };
    fields.insert("project".to_string(), project.into());

    let mut state = state.write().await;
    if state.get(kinds::PROJECT.endpoint, project).is_none() {
        return error(StatusCode::NOT_FOUND, "No such project.");
    }
    let object = state.insert(kind.endpoint, Value::Object(fields));
    (StatusCode::CREATED, Json(object)).into_response()
}

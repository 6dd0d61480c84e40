//! Generic collection and instance handlers, shared by every kind.

use std::collections::HashMap;

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::{error, parse_id, SharedState};
use crate::mock_server::state::{MockState, WriteError};
use crate::models::kinds;
use crate::Descriptor;

const LAZY_PAGINATION: &str = "x-lazy-pagination";
const DISABLE_PAGINATION: &str = "x-disable-pagination";
const NEXT_PAGE: &str = "x-pagination-next";

/// GET /{endpoint}
///
/// With `x-disable-pagination` and no `page`, everything comes back at once.
/// Otherwise one page is served, and `X-Pagination-Next` is set while more
/// remain and the client asked for lazy pagination.
pub async fn list(
    state: SharedState,
    kind: &'static Descriptor,
    mut query: HashMap<String, String>,
    headers: &HeaderMap,
) -> Response {
    let page = query.remove("page");
    let page_size = query.remove("page_size");

    let state = state.read().await;
    let items = state.list(kind.endpoint, &query);

    if headers.contains_key(DISABLE_PAGINATION) && page.is_none() {
        return (StatusCode::OK, Json(items)).into_response();
    }

    let Ok(page) = page.as_deref().unwrap_or("1").parse::<usize>() else {
        return error(StatusCode::NOT_FOUND, "Invalid page.");
    };
    if page == 0 {
        return error(StatusCode::NOT_FOUND, "Invalid page.");
    }
    let page_size = page_size
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|size| *size > 0)
        .unwrap_or(state.page_size);

    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    let has_next = end < items.len();
    let body: Vec<Value> = items[start..end].to_vec();

    let mut response = (StatusCode::OK, Json(body)).into_response();
    if has_next && headers.contains_key(LAZY_PAGINATION) {
        let next = format!(
            "/api/v1/{}?page={}&page_size={}",
            kind.endpoint,
            page + 1,
            page_size
        );
        if let Ok(value) = HeaderValue::from_str(&next) {
            response.headers_mut().insert(NEXT_PAGE, value);
        }
    }
    response
}

/// POST /{endpoint}
pub async fn create(state: SharedState, kind: &'static Descriptor, body: Value) -> Response {
    let Value::Object(fields) = body else {
        return error(StatusCode::BAD_REQUEST, "Invalid JSON body.");
    };

    if let Some(missing) = kind
        .create_fields
        .iter()
        .find(|field| !fields.contains_key(**field))
    {
        return error(
            StatusCode::BAD_REQUEST,
            &format!("{missing}: This field is required."),
        );
    }

    let mut state = state.write().await;
    let object = state.insert(kind.endpoint, Value::Object(fields));
    (StatusCode::CREATED, Json(object)).into_response()
}

/// GET /{endpoint}/{id}
pub async fn get(state: SharedState, kind: &'static Descriptor, id: &str) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let state = state.read().await;
    match state.get(kind.endpoint, id) {
        Some(object) => (StatusCode::OK, Json(object.clone())).into_response(),
        None => error(StatusCode::NOT_FOUND, "No such object."),
    }
}

/// PUT or PATCH /{endpoint}/{id}
///
/// A `comment` in the body goes to the object's history instead of its
/// fields.
pub async fn update(
    state: SharedState,
    kind: &'static Descriptor,
    id: &str,
    mut body: Value,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let comment = body
        .as_object_mut()
        .and_then(|fields| fields.remove("comment"))
        .and_then(|c| c.as_str().map(str::to_string))
        .filter(|c| !c.is_empty());

    let mut state = state.write().await;
    match state.update(kind.endpoint, id, body) {
        Ok(object) => {
            if let (Some(entity), Some(comment)) = (kind.history_entity, comment) {
                state.add_comment(entity, id, &comment);
            }
            (StatusCode::OK, Json(object)).into_response()
        }
        Err(WriteError::NotFound) => error(StatusCode::NOT_FOUND, "No such object."),
        Err(WriteError::VersionConflict) => error(
            StatusCode::BAD_REQUEST,
            "The version doesn't match with the current one",
        ),
    }
}

/// DELETE /{endpoint}/{id}
pub async fn delete(
    state: SharedState,
    kind: &'static Descriptor,
    id: &str,
    query: HashMap<String, String>,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if kind.requires_move_to && !query.contains_key("moveTo") {
        return error(StatusCode::BAD_REQUEST, "moveTo is required.");
    }

    let mut state = state.write().await;
    if state.delete(kind.endpoint, id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, "No such object.")
    }
}

/// GET /{endpoint}/{id}/stats
///
/// Counts the user stories of a project or milestone.
pub async fn stats(state: SharedState, kind: &'static Descriptor, id: &str) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let filter_key = if kind == &kinds::PROJECT {
        "project"
    } else if kind == &kinds::MILESTONE {
        "milestone"
    } else {
        return error(StatusCode::NOT_FOUND, "Not found.");
    };

    let state = state.read().await;
    let Some(object) = state.get(kind.endpoint, id) else {
        return error(StatusCode::NOT_FOUND, "No such object.");
    };

    let mut filters = HashMap::new();
    filters.insert(filter_key.to_string(), id.to_string());
    let stories = state.list(kinds::USER_STORY.endpoint, &filters);
    let completed = stories
        .iter()
        .filter(|story| story["is_closed"].as_bool().unwrap_or(false))
        .count();

    Json(json!({
        "name": object["name"],
        "total_userstories": stories.len(),
        "completed_userstories": completed,
    }))
    .into_response()
}

/// GET /{endpoint}/custom-attributes-values/{id}
pub async fn get_attribute_values(
    state: SharedState,
    kind: &'static Descriptor,
    id: &str,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let mut state = state.write().await;
    let Some(attribute_ids) = defined_attributes(&state, kind, id) else {
        return error(StatusCode::NOT_FOUND, "No such object.");
    };
    let values = state.attribute_values(kind.endpoint, id, &attribute_ids).clone();
    Json(values).into_response()
}

/// PATCH /{endpoint}/custom-attributes-values/{id}
pub async fn set_attribute_values(
    state: SharedState,
    kind: &'static Descriptor,
    id: &str,
    body: Value,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let mut state = state.write().await;
    let Some(attribute_ids) = defined_attributes(&state, kind, id) else {
        return error(StatusCode::NOT_FOUND, "No such object.");
    };

    let stored = state.attribute_values(kind.endpoint, id, &attribute_ids);
    let current = stored["version"].as_i64().unwrap_or(1);
    if body["version"].as_i64().is_some_and(|sent| sent != current) {
        return error(
            StatusCode::BAD_REQUEST,
            "The version doesn't match with the current one",
        );
    }

    if let Some(values) = body.get("attributes_values") {
        stored["attributes_values"] = values.clone();
    }
    stored["version"] = (current + 1).into();
    Json(stored.clone()).into_response()
}

/// Ids of the custom attributes defined on the object's project, or `None`
/// if the object does not exist or its kind has no custom attributes.
fn defined_attributes(state: &MockState, kind: &'static Descriptor, id: i64) -> Option<Vec<i64>> {
    let definitions = if kind == &kinds::USER_STORY {
        &kinds::USER_STORY_ATTRIBUTE
    } else if kind == &kinds::TASK {
        &kinds::TASK_ATTRIBUTE
    } else if kind == &kinds::ISSUE {
        &kinds::ISSUE_ATTRIBUTE
    } else if kind == &kinds::EPIC {
        &kinds::EPIC_ATTRIBUTE
    } else {
        return None;
    };

    let object = state.get(kind.endpoint, id)?;
    let mut filters = HashMap::new();
    if let Some(project) = object["project"].as_i64() {
        filters.insert("project".to_string(), project.to_string());
    }
    Some(
        state
            .list(definitions.endpoint, &filters)
            .iter()
            .filter_map(|attribute| attribute["id"].as_i64())
            .collect(),
    )
}

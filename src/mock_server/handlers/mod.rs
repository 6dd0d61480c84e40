//! HTTP request handlers for the mock server.
//!
//! Everything under `/api/v1` goes through [`dispatch`], which routes on the
//! method and path segments. Resource paths are resolved against the kind
//! table, so every kind the client knows about is served.

pub mod attachments;
pub mod auth;
pub mod history;
pub mod resources;
pub mod search;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;
use crate::models::kinds;
use crate::Descriptor;

/// Shared state as seen by handlers.
pub type SharedState = Arc<RwLock<MockState>>;

const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Any method on `/api/v1/*path`.
pub async fn dispatch(
    State(state): State<SharedState>,
    method: Method,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    request: Request,
) -> Response {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let token = bearer_token(&headers);

    match (&method, segments.as_slice()) {
        (&Method::POST, ["auth"]) => return auth::login(state, read_json(request).await).await,
        (&Method::POST, ["auth", "refresh"]) => {
            return auth::refresh(state, read_json(request).await).await
        }
        _ => {}
    }

    if !state.read().await.is_authorized(token.as_deref()) {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }

    match (&method, segments.as_slice()) {
        (&Method::GET, ["users", "me"]) => auth::me(state, token).await,
        (&Method::GET, ["search"]) => search::search(state, query).await,
        (&Method::POST, ["importer", project, import_type]) => {
            search::import(state, project, import_type, read_json(request).await).await
        }
        (&Method::GET, ["history", entity, id]) => history::get(state, entity, id).await,
        (&Method::POST, ["history", entity, id, action]) => {
            history::comment_action(state, entity, id, action, query).await
        }
        _ => resource_route(state, method, &segments, query, headers, request).await,
    }
}

async fn resource_route(
    state: SharedState,
    method: Method,
    segments: &[&str],
    query: HashMap<String, String>,
    headers: HeaderMap,
    request: Request,
) -> Response {
    let Some((kind, rest)) = resolve(segments) else {
        return error(StatusCode::NOT_FOUND, "Not found.");
    };

    match (method, rest) {
        (Method::GET, []) => resources::list(state, kind, query, &headers).await,
        (Method::POST, []) if kind.is_attachment() => {
            attachments::create(state, kind, request).await
        }
        (Method::POST, []) => resources::create(state, kind, read_json(request).await).await,
        (Method::GET, ["custom-attributes-values", id]) => {
            resources::get_attribute_values(state, kind, id).await
        }
        (Method::PATCH, ["custom-attributes-values", id]) => {
            resources::set_attribute_values(state, kind, id, read_json(request).await).await
        }
        (Method::GET, [id, "stats"]) => resources::stats(state, kind, id).await,
        (Method::GET, [id]) => resources::get(state, kind, id).await,
        (Method::PUT | Method::PATCH, [id]) => {
            resources::update(state, kind, id, read_json(request).await).await
        }
        (Method::DELETE, [id]) => resources::delete(state, kind, id, query).await,
        _ => error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed."),
    }
}

/// Split a path into a kind and the segments after its endpoint.
///
/// Two-segment endpoints such as `userstories/attachments` win over their
/// one-segment prefix.
fn resolve<'a, 'b>(segments: &'a [&'b str]) -> Option<(&'static Descriptor, &'a [&'b str])> {
    if let [first, second, rest @ ..] = segments {
        if let Some(kind) = kinds::by_endpoint(&format!("{first}/{second}")) {
            return Some((kind, rest));
        }
    }
    let (first, rest) = segments.split_first()?;
    kinds::by_endpoint(first).map(|kind| (kind, rest))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (_, token) = value.split_once(' ')?;
    Some(token.trim().to_string())
}

/// Request body as JSON; an empty or malformed body reads as `null`.
async fn read_json(request: Request) -> Value {
    match to_bytes(request.into_body(), BODY_LIMIT).await {
        Ok(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Parse an id segment, answering 404 for anything that is not a number.
fn parse_id(raw: &str) -> Result<i64, Response> {
    raw.parse()
        .map_err(|_| error(StatusCode::NOT_FOUND, "No such object."))
}

/// Taiga's error envelope.
pub(crate) fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "_error_message": message,
            "_error_type": "taiga.base.exceptions.BadRequest",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_two_segment_endpoints() {
        let (kind, rest) = resolve(&["userstories", "attachments", "5"]).unwrap();
        assert_eq!(kind, &kinds::USER_STORY_ATTACHMENT);
        assert_eq!(rest, &["5"]);

        let (kind, rest) = resolve(&["userstories", "12"]).unwrap();
        assert_eq!(kind, &kinds::USER_STORY);
        assert_eq!(rest, &["12"]);

        let (kind, rest) = resolve(&["issues", "custom-attributes-values", "3"]).unwrap();
        assert_eq!(kind, &kinds::ISSUE);
        assert_eq!(rest, &["custom-attributes-values", "3"]);

        assert!(resolve(&["nowhere"]).is_none());
        assert!(resolve(&[]).is_none());
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(AUTHORIZATION, "Application xyz".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("xyz"));
    }
}

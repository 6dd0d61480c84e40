//! Multipart upload handler for attachment endpoints.

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use super::{error, SharedState};
use crate::Descriptor;

/// POST /{kind}/attachments
///
/// Expects an `attached_file` part plus `project` and `object_id` fields.
/// Numeric form fields are stored as numbers.
pub async fn create(state: SharedState, kind: &'static Descriptor, request: Request) -> Response {
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(_) => return error(StatusCode::BAD_REQUEST, "Expected a multipart body."),
    };

    let mut fields = Map::new();
    let mut file: Option<(String, usize)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return error(StatusCode::BAD_REQUEST, "Malformed multipart body."),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let Ok(data) = field.bytes().await else {
            return error(StatusCode::BAD_REQUEST, "Malformed multipart body.");
        };

        match file_name {
            Some(file_name) if name == "attached_file" => file = Some((file_name, data.len())),
            _ => {
                let text = String::from_utf8_lossy(&data).into_owned();
                let value = text.parse::<i64>().map(Value::from).unwrap_or(Value::String(text));
                fields.insert(name, value);
            }
        }
    }

    let Some((file_name, size)) = file else {
        return error(StatusCode::BAD_REQUEST, "attached_file: No file was submitted.");
    };
    if let Some(missing) = ["project", "object_id"]
        .iter()
        .find(|key| !fields.contains_key(**key))
    {
        return error(
            StatusCode::BAD_REQUEST,
            &format!("{missing}: This field is required."),
        );
    }

    fields.insert(
        "attached_file".to_string(),
        format!("attachments/{}/{file_name}", kind.endpoint).into(),
    );
    fields.insert("name".to_string(), file_name.into());
    fields.insert("size".to_string(), size.into());

    let mut state = state.write().await;
    let object = state.insert(kind.endpoint, Value::Object(fields));
    (StatusCode::CREATED, Json(object)).into_response()
}

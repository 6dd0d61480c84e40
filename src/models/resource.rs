//! Generic resource instances and the values they hold.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use super::descriptor::Descriptor;
use super::searchable::SearchableList;
use crate::client::TaigaClient;
use crate::error::{Result, TaigaError};
use crate::request::{Payload, Query, RawResponse, Request};
use crate::traits::{Delete, Update};

/// Fields holding server timestamps.
const DATE_FIELDS: [&str; 2] = ["created_date", "modified_date"];

static SERVER_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+-\d+-\d+T\d+:\d+:\d+\+0000").expect("timestamp pattern compiles")
});

const SERVER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// One field value of a [`Resource`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Plain JSON as returned by the server or set by the caller.
    Value(Value),
    /// A server timestamp, converted to local time.
    Date(DateTime<Local>),
    /// A nested object parsed into an instance.
    One(Box<Resource>),
    /// A nested array parsed into instances.
    Many(SearchableList),
}

impl Field {
    /// The plain JSON value, if this is not a parsed date or nested object.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_date(&self) -> Option<&DateTime<Local>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::One(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&SearchableList> {
        match self {
            Self::Many(list) => Some(list),
            _ => None,
        }
    }

    /// Convert back to JSON. Dates use the server's timestamp format.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Date(d) => Value::String(format_timestamp(d)),
            Self::One(r) => r.to_value(),
            Self::Many(list) => Value::Array(list.iter().map(Resource::to_value).collect()),
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Self::Value(Value::Null) | Self::Value(Value::Bool(false)) => false,
            Self::Value(Value::String(s)) => !s.is_empty(),
            Self::Value(Value::Array(a)) => !a.is_empty(),
            Self::Value(Value::Object(o)) => !o.is_empty(),
            Self::Value(Value::Number(n)) => n.as_f64() != Some(0.0),
            Self::Many(list) => !list.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(Value::String(s)) => f.write_str(s),
            Self::Value(v) => write!(f, "{v}"),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::One(r) => write!(f, "{r}"),
            Self::Many(list) => {
                f.write_str("[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Date(d) => serializer.serialize_str(&format_timestamp(d)),
            Self::One(r) => r.serialize(serializer),
            Self::Many(list) => list.serialize(serializer),
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<DateTime<Local>> for Field {
    fn from(value: DateTime<Local>) -> Self {
        Self::Date(value)
    }
}

impl From<Resource> for Field {
    fn from(value: Resource) -> Self {
        Self::One(Box::new(value))
    }
}

impl From<SearchableList> for Field {
    fn from(value: SearchableList) -> Self {
        Self::Many(value)
    }
}

fn format_timestamp(date: &DateTime<Local>) -> String {
    date.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S+0000")
        .to_string()
}

/// Parse a server timestamp, keeping the raw value when it does not match.
fn parse_timestamp(value: Value) -> Field {
    // prefix match: anything after the offset is ignored
    let parsed = value
        .as_str()
        .and_then(|s| SERVER_TIMESTAMP.find(s))
        .and_then(|m| DateTime::parse_from_str(m.as_str(), SERVER_TIMESTAMP_FORMAT).ok());

    match parsed {
        Some(date) => Field::Date(date.with_timezone(&Local)),
        None => Field::Value(value),
    }
}

/// An instance of any resource kind.
///
/// The kind's [`Descriptor`] decides which fields are written back and how
/// nested fields were parsed; the fields themselves are an open map filled
/// from server responses or set locally. Changes stay local until
/// [`Update::update`] or [`Update::patch`] is called.
#[derive(Clone)]
pub struct Resource {
    kind: &'static Descriptor,
    client: TaigaClient,
    fields: BTreeMap<String, Field>,
}

impl Resource {
    /// Create an empty instance of `kind`.
    pub fn new(client: &TaigaClient, kind: &'static Descriptor) -> Self {
        Self {
            kind,
            client: client.clone(),
            fields: BTreeMap::new(),
        }
    }

    /// Create a partial instance that only knows its id, for updating or
    /// deleting without fetching first.
    pub fn with_id(client: &TaigaClient, kind: &'static Descriptor, id: i64) -> Self {
        let mut resource = Self::new(client, kind);
        resource.set("id", id);
        resource
    }

    /// Parse a JSON value. Objects become instances and arrays of objects
    /// become lists. Anything else, including an array holding ids or other
    /// plain values, is returned unchanged.
    pub fn parse(client: &TaigaClient, kind: &'static Descriptor, raw: Value) -> Field {
        match raw {
            Value::Object(map) => Field::One(Box::new(Self::from_map(client, kind, map))),
            Value::Array(items) if items.iter().all(Value::is_object) => Field::Many(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(Self::from_map(client, kind, map)),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Field::Value(other),
        }
    }

    /// Parse a JSON object into an instance.
    ///
    /// # Errors
    ///
    /// Returns an unexpected-response error if `raw` is not an object.
    pub fn from_value(client: &TaigaClient, kind: &'static Descriptor, raw: Value) -> Result<Self> {
        match raw {
            Value::Object(map) => Ok(Self::from_map(client, kind, map)),
            other => Err(TaigaError::UnexpectedResponse(format!(
                "expected a {} object, got {other}",
                kind.name
            ))),
        }
    }

    pub(crate) fn from_response(
        client: &TaigaClient,
        kind: &'static Descriptor,
        response: &RawResponse,
    ) -> Result<Self> {
        Self::from_value(client, kind, response.json_value()?)
    }

    fn from_map(client: &TaigaClient, kind: &'static Descriptor, map: Map<String, Value>) -> Self {
        let fields = map
            .into_iter()
            .map(|(key, value)| {
                let field = if let Some(nested) = kind.nested_kind(&key) {
                    Self::parse(client, nested, value)
                } else if DATE_FIELDS.contains(&key.as_str()) {
                    parse_timestamp(value)
                } else {
                    Field::Value(value)
                };
                (key, field)
            })
            .collect();

        Self {
            kind,
            client: client.clone(),
            fields,
        }
    }

    /// The kind of this instance.
    pub fn kind(&self) -> &'static Descriptor {
        self.kind
    }

    /// The client this instance issues requests through.
    pub fn client(&self) -> &TaigaClient {
        &self.client
    }

    /// The numeric identity, if known.
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Field::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Field::as_i64)
    }

    /// Set a field locally.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Field>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Field> {
        self.fields.remove(key)
    }

    /// All fields, ordered by name.
    pub fn fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    /// Fields sent on `update`: those the kind allows writing.
    pub fn to_write_payload(&self) -> Payload {
        self.fields
            .iter()
            .filter(|(key, _)| self.kind.is_writable(key))
            .map(|(key, field)| (key.clone(), field.to_value()))
            .collect()
    }

    /// Every field as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(key, field)| (key.clone(), field.to_value()))
                .collect(),
        )
    }

    pub(crate) fn require_id(&self) -> Result<i64> {
        self.id().ok_or_else(|| {
            TaigaError::Usage(format!("{} instance has no id", self.kind.name))
        })
    }

    /// Request for `{endpoint}/{id}`.
    pub(crate) fn item_request(&self) -> Result<Request> {
        Ok(item_request(self.kind, self.require_id()?))
    }

    /// Take `version` from a write response so the next write is accepted.
    fn refresh_version(&mut self, response: &RawResponse) {
        match response.json_value() {
            Ok(Value::Object(body)) => {
                if let Some(version) = body.get("version") {
                    self.set("version", version.clone());
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "write response is not JSON"),
        }
    }
}

pub(crate) fn item_request(kind: &Descriptor, id: i64) -> Request {
    Request::new(format!("{}/{{id}}", kind.endpoint)).param("id", id)
}

/// Reject deletes that would orphan dependents.
pub(crate) fn check_move_to(kind: &Descriptor, query: &Query) -> Result<()> {
    if kind.requires_move_to && query.get("moveTo").is_none() {
        return Err(TaigaError::Usage(format!(
            "Deleting a {} requires a moveTo id",
            kind.name
        )));
    }
    Ok(())
}

#[async_trait]
impl Update for Resource {
    async fn update(&mut self, overrides: Payload) -> Result<()> {
        tracing::debug!(kind = self.kind.name, id = ?self.id(), "updating");
        let mut body = self.to_write_payload();
        body.extend(overrides);

        let request = self.item_request()?.payload(body);
        let response = self.client.put(request).await?;
        self.refresh_version(&response);
        Ok(())
    }

    async fn patch(&mut self, fields: &[&str], overrides: Payload) -> Result<()> {
        tracing::debug!(kind = self.kind.name, id = ?self.id(), ?fields, "patching");
        // named fields that are unset or read-only are skipped
        let mut body: Payload = self
            .to_write_payload()
            .into_iter()
            .filter(|(key, _)| fields.contains(&key.as_str()))
            .collect();
        body.extend(overrides);

        let request = self.item_request()?.payload(body);
        let response = self.client.patch(request).await?;
        self.refresh_version(&response);
        Ok(())
    }
}

#[async_trait]
impl Delete for Resource {
    async fn delete_with_query(&self, query: Query) -> Result<()> {
        check_move_to(self.kind, &query)?;
        let request = self.item_request()?.query(query);
        tracing::debug!(kind = self.kind.name, id = ?self.id(), "deleting");
        self.client.delete(request).await?;
        Ok(())
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.fields == other.fields
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("kind", &self.kind.name)
            .field("fields", &self.fields)
            .finish()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get(self.kind.repr_attribute) {
            Some(field) if field.is_truthy() => write!(f, "{field}"),
            _ => match self.id() {
                Some(id) => write!(f, "{}({id})", self.kind.name),
                None => write!(f, "{}(None)", self.kind.name),
            },
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, field) in &self.fields {
            map.serialize_entry(key, field)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::kinds;
    use chrono::{Datelike, TimeZone, Timelike};
    use serde_json::json;

    fn client() -> TaigaClient {
        TaigaClient::with_token("http://host", "f4k3").unwrap()
    }

    #[test]
    fn test_parse_non_object_returned_unchanged() {
        let parsed = Resource::parse(&client(), &kinds::PROJECT, json!(42));
        assert_eq!(parsed, Field::Value(json!(42)));
    }

    #[test]
    fn test_parse_keeps_arrays_of_plain_values() {
        let raw = json!({"id": 1, "name": "Sprint 1", "user_stories": [3, 4]});
        let milestone = Resource::from_value(&client(), &kinds::MILESTONE, raw).unwrap();
        assert_eq!(milestone.get("user_stories"), Some(&Field::Value(json!([3, 4]))));

        let mixed = Resource::parse(&client(), &kinds::TASK, json!([{"id": 1}, 5, "x"]));
        assert_eq!(mixed, Field::Value(json!([{"id": 1}, 5, "x"])));
        assert_eq!(mixed.to_value(), json!([{"id": 1}, 5, "x"]));
    }

    #[test]
    fn test_parse_nested_fields() {
        let raw = json!({
            "id": 1,
            "name": "Project 1",
            "users": [{"id": 3, "full_name": "Admin"}, {"id": 4, "full_name": "Bot"}],
            "roles": [],
            "owner": {"id": 3}
        });
        let project = Resource::from_value(&client(), &kinds::PROJECT, raw).unwrap();

        let users = project.get("users").and_then(Field::as_list).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].kind(), &kinds::USER);
        assert_eq!(users[1].get_str("full_name"), Some("Bot"));

        assert!(project.get("roles").and_then(Field::as_list).unwrap().is_empty());
        // not declared as nested, stays raw
        assert_eq!(project.get("owner"), Some(&Field::Value(json!({"id": 3}))));
    }

    #[test]
    fn test_parse_server_timestamps() {
        let raw = json!({
            "id": 1,
            "created_date": "2015-02-10T17:55:05+0000",
            "modified_date": "2015-02-10T17:55:05.123Z",
            "finish_date": "2015-02-10T17:55:05+0000"
        });
        let story = Resource::from_value(&client(), &kinds::USER_STORY, raw).unwrap();

        let created = story.get("created_date").and_then(Field::as_date).unwrap();
        let utc = created.with_timezone(&Utc);
        assert_eq!((utc.year(), utc.month(), utc.day()), (2015, 2, 10));
        assert_eq!((utc.hour(), utc.minute(), utc.second()), (17, 55, 5));

        assert_eq!(story.get_str("modified_date"), Some("2015-02-10T17:55:05.123Z"));
        assert_eq!(story.get_str("finish_date"), Some("2015-02-10T17:55:05+0000"));
    }

    #[test]
    fn test_timestamp_with_trailing_text() {
        let raw = json!({
            "id": 1,
            "created_date": "2015-02-10T17:55:05+0000 (UTC)",
            "modified_date": "x2015-02-10T17:55:05+0000"
        });
        let story = Resource::from_value(&client(), &kinds::USER_STORY, raw).unwrap();

        let created = story.get("created_date").and_then(Field::as_date).unwrap();
        let utc = created.with_timezone(&Utc);
        assert_eq!((utc.hour(), utc.minute(), utc.second()), (17, 55, 5));

        // the pattern must match from the start
        assert_eq!(story.get_str("modified_date"), Some("x2015-02-10T17:55:05+0000"));
    }

    #[test]
    fn test_date_serializes_in_server_format() {
        let date = Utc.with_ymd_and_hms(2015, 2, 10, 17, 55, 5).unwrap();
        let field = Field::Date(date.with_timezone(&Local));
        assert_eq!(field.to_value(), json!("2015-02-10T17:55:05+0000"));
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let result = Resource::from_value(&client(), &kinds::TASK, json!([1, 2]));
        assert!(matches!(result, Err(TaigaError::UnexpectedResponse(_))));
    }

    #[test]
    fn test_write_payload_only_allowed_fields() {
        let mut story = Resource::with_id(&client(), &kinds::USER_STORY, 7);
        story.set("subject", "Write tests");
        story.set("project", 1);
        story.set("ref", 12);
        story.set("version", 3);

        let payload = story.to_write_payload();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload["subject"], "Write tests");
        assert_eq!(payload["project"], 1);
        assert!(!payload.contains_key("id"));
    }

    #[test]
    fn test_write_payload_empty_without_allowed_fields() {
        let mut user = Resource::with_id(&client(), &kinds::USER, 1);
        user.set("full_name", "Admin");
        assert!(user.to_write_payload().is_empty());
    }

    #[test]
    fn test_display_uses_repr_attribute() {
        let mut story = Resource::with_id(&client(), &kinds::USER_STORY, 7);
        assert_eq!(story.to_string(), "UserStory(7)");
        story.set("subject", "");
        assert_eq!(story.to_string(), "UserStory(7)");
        story.set("subject", "Login form");
        assert_eq!(story.to_string(), "Login form");
    }

    #[test]
    fn test_check_move_to() {
        let empty = Query::new();
        assert!(check_move_to(&kinds::TASK, &empty).is_ok());
        assert!(matches!(
            check_move_to(&kinds::SWIMLANE, &empty),
            Err(TaigaError::Usage(_))
        ));
        assert!(check_move_to(&kinds::SWIMLANE, &Query::new().with("moveTo", 2)).is_ok());
    }

    #[test]
    fn test_item_request_path() {
        let request = item_request(&kinds::USER_STORY_ATTACHMENT, 9);
        assert_eq!(request.path().unwrap(), "userstories/attachments/9");
    }
}

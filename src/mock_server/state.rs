//! Mock server state management.
//!
//! Provides the in-memory data store for the mock Taiga API server. Objects
//! are kept as raw JSON per endpoint, so every resource kind is served by
//! the same handful of operations.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+0000";

/// Credentials of a user that can log in.
#[derive(Debug, Clone)]
struct Account {
    password: String,
    user_id: i64,
}

/// Why a write was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// No object with that id.
    NotFound,
    /// The `version` sent does not match the stored one.
    VersionConflict,
}

/// Shared state for the mock server.
///
/// Wrapped in `Arc<RwLock<_>>` for concurrent access from handlers.
#[derive(Debug)]
pub struct MockState {
    /// Objects indexed by endpoint (e.g. `userstories`) and id.
    pub objects: HashMap<String, BTreeMap<i64, Value>>,

    /// Custom attribute values indexed by endpoint and object id.
    pub attribute_values: HashMap<(String, i64), Value>,

    /// History entries indexed by entity (e.g. `userstory`) and object id.
    pub history: HashMap<(String, i64), Vec<Value>>,

    /// Number of items per page when the client asks for lazy pagination.
    pub page_size: usize,

    /// If set, requests must carry one of the issued tokens.
    pub require_auth: bool,

    accounts: HashMap<String, Account>,
    tokens: HashMap<String, i64>,
    refresh_tokens: HashMap<String, i64>,
    next_id: i64,
    next_token: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            attribute_values: HashMap::new(),
            history: HashMap::new(),
            page_size: 30,
            require_auth: false,
            accounts: HashMap::new(),
            tokens: HashMap::new(),
            refresh_tokens: HashMap::new(),
            next_id: 1,
            next_token: 0,
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a user that can log in with `username` and `password`.
    pub fn with_user(mut self, username: &str, password: &str, full_name: &str) -> Self {
        let user = self.insert(
            "users",
            json!({
                "username": username,
                "full_name": full_name,
                "email": format!("{username}@example.com"),
            }),
        );
        let user_id = user["id"].as_i64().unwrap_or_default();
        self.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                user_id,
            },
        );
        self
    }

    /// Add an object to an endpoint.
    pub fn with_object(mut self, endpoint: &str, object: Value) -> Self {
        self.insert(endpoint, object);
        self
    }

    /// Accept `token` as already issued to the first user, and reject
    /// requests without a known token.
    pub fn with_required_token(mut self, token: &str) -> Self {
        let user_id = self.accounts.values().map(|a| a.user_id).min().unwrap_or(0);
        self.tokens.insert(token.to_string(), user_id);
        self.require_auth = true;
        self
    }

    /// Serve lazy pages of `page_size` items.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Check credentials and issue a token pair.
    pub fn login(&mut self, username: &str, password: &str) -> Option<(String, String, i64)> {
        let account = self.accounts.get(username)?;
        if account.password != password {
            return None;
        }
        let user_id = account.user_id;
        let (token, refresh) = self.issue_tokens(user_id);
        Some((token, refresh, user_id))
    }

    /// Exchange a refresh token for a new pair. The old refresh token is
    /// consumed.
    pub fn refresh(&mut self, refresh: &str) -> Option<(String, String)> {
        let user_id = self.refresh_tokens.remove(refresh)?;
        Some(self.issue_tokens(user_id))
    }

    fn issue_tokens(&mut self, user_id: i64) -> (String, String) {
        self.next_token += 1;
        let token = format!("token-{}", self.next_token);
        let refresh = format!("refresh-{}", self.next_token);
        self.tokens.insert(token.clone(), user_id);
        self.refresh_tokens.insert(refresh.clone(), user_id);
        (token, refresh)
    }

    /// The user a token belongs to, or `None` for unknown tokens.
    pub fn user_for_token(&self, token: &str) -> Option<i64> {
        self.tokens.get(token).copied()
    }

    /// Whether a request carrying `token` may proceed.
    pub fn is_authorized(&self, token: Option<&str>) -> bool {
        !self.require_auth || token.is_some_and(|t| self.tokens.contains_key(t))
    }

    /// Store a new object, assigning `id`, `version` and timestamps.
    pub fn insert(&mut self, endpoint: &str, object: Value) -> Value {
        let mut fields = match object {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let id = match fields.get("id").and_then(Value::as_i64) {
            Some(id) => {
                self.next_id = self.next_id.max(id + 1);
                id
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();

        fields.insert("id".to_string(), id.into());
        fields.entry("version").or_insert_with(|| 1.into());
        fields
            .entry("created_date")
            .or_insert_with(|| now.clone().into());
        fields.insert("modified_date".to_string(), now.into());

        let object = Value::Object(fields);
        self.objects
            .entry(endpoint.to_string())
            .or_default()
            .insert(id, object.clone());
        object
    }

    /// Get an object by id.
    pub fn get(&self, endpoint: &str, id: i64) -> Option<&Value> {
        self.objects.get(endpoint)?.get(&id)
    }

    /// Objects of an endpoint whose fields equal every filter, in id order.
    ///
    /// Filter values are compared against the field's query-string form;
    /// filters naming a missing field exclude the object.
    pub fn list(&self, endpoint: &str, filters: &HashMap<String, String>) -> Vec<Value> {
        let Some(objects) = self.objects.get(endpoint) else {
            return Vec::new();
        };
        objects
            .values()
            .filter(|object| {
                filters.iter().all(|(key, expected)| {
                    object
                        .get(key)
                        .is_some_and(|value| query_form(value) == *expected)
                })
            })
            .cloned()
            .collect()
    }

    /// Apply `changes` to an object.
    ///
    /// A `version` in `changes` must match the stored one; every successful
    /// write bumps it.
    pub fn update(&mut self, endpoint: &str, id: i64, changes: Value) -> Result<Value, WriteError> {
        let object = self
            .objects
            .get_mut(endpoint)
            .and_then(|objects| objects.get_mut(&id))
            .ok_or(WriteError::NotFound)?;

        let current = object["version"].as_i64().unwrap_or(1);
        if let Some(sent) = changes.get("version").and_then(Value::as_i64) {
            if sent != current {
                return Err(WriteError::VersionConflict);
            }
        }

        if let (Value::Object(stored), Value::Object(changes)) = (&mut *object, changes) {
            for (key, value) in changes {
                if key != "id" && key != "version" {
                    stored.insert(key, value);
                }
            }
            stored.insert("version".to_string(), (current + 1).into());
            stored.insert(
                "modified_date".to_string(),
                Utc::now().format(TIMESTAMP_FORMAT).to_string().into(),
            );
        }

        Ok(object.clone())
    }

    /// Remove an object. Returns false if it did not exist.
    pub fn delete(&mut self, endpoint: &str, id: i64) -> bool {
        self.objects
            .get_mut(endpoint)
            .and_then(|objects| objects.remove(&id))
            .is_some()
    }

    /// Custom attribute values of an object, created on first access.
    ///
    /// Every id in `attribute_ids` gets a `null` value unless it already has
    /// one, like the server does for attributes defined on the project.
    pub fn attribute_values(&mut self, endpoint: &str, id: i64, attribute_ids: &[i64]) -> &mut Value {
        let record = self
            .attribute_values
            .entry((endpoint.to_string(), id))
            .or_insert_with(|| json!({ "attributes_values": {}, "version": 1 }));
        if let Some(values) = record["attributes_values"].as_object_mut() {
            for attribute_id in attribute_ids {
                values.entry(attribute_id.to_string()).or_insert(Value::Null);
            }
        }
        record
    }

    /// Record a comment in an object's history.
    pub fn add_comment(&mut self, entity: &str, id: i64, comment: &str) -> String {
        let entries = self.history.entry((entity.to_string(), id)).or_default();
        let entry_id = format!("{entity}-{id}-{}", entries.len() + 1);
        entries.push(json!({
            "id": entry_id,
            "comment": comment,
            "delete_comment_date": null,
        }));
        entry_id
    }

    /// Mark a history comment deleted or restore it. Returns false if there is
    /// no such comment.
    pub fn set_comment_deleted(&mut self, entity: &str, id: i64, comment_id: &str, deleted: bool) -> bool {
        let Some(entries) = self.history.get_mut(&(entity.to_string(), id)) else {
            return false;
        };
        let Some(entry) = entries.iter_mut().find(|e| e["id"] == comment_id) else {
            return false;
        };
        entry["delete_comment_date"] = if deleted {
            Utc::now().format(TIMESTAMP_FORMAT).to_string().into()
        } else {
            Value::Null
        };
        true
    }
}

/// How a JSON value appears in a query string.
fn query_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

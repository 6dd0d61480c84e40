//! Request descriptions and raw responses.
//!
//! A [`Request`] names a URI template plus everything needed to fill it in
//! and send it. The dispatcher verbs on [`TaigaClient`](crate::TaigaClient)
//! pick the HTTP method; the request only carries data.

use std::fmt;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, TaigaError};

/// JSON object sent as a request body.
pub type Payload = serde_json::Map<String, Value>;

/// Build a [`Payload`] from key/value pairs.
///
/// ```
/// use serde_json::json;
///
/// let fields = taigapi::payload([("name", json!("TEST")), ("is_private", json!(false))]);
/// assert_eq!(fields["name"], "TEST");
/// ```
pub fn payload<K, V, I>(pairs: I) -> Payload
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Ordered list of query parameters.
///
/// Values are taken as JSON scalars and rendered the way the server expects
/// them in a query string (strings unquoted, numbers and booleans as text).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = render_query_value(&value.into());
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Look up a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove a parameter, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(idx).1)
    }

    /// Returns true if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// The parameters as key/value pairs, in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Query::new();
        for (k, v) in iter {
            query.insert(k, v);
        }
        query
    }
}

fn render_query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A file sent as one part of a multipart upload.
#[derive(Clone)]
pub struct FilePart {
    /// Form field name.
    pub field_name: String,
    /// File name reported to the server.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One logical API call: a URI template, its substitutions and the
/// optional query, body, files and GET flags.
///
/// # Example
///
/// ```
/// use taigapi::{Query, Request};
///
/// let request = Request::new("/projects/{id}/stats")
///     .param("id", 42)
///     .query(Query::new().with("detail", true));
/// assert_eq!(request.path().unwrap(), "/projects/42/stats");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Request {
    template: String,
    params: Vec<(String, String)>,
    query: Query,
    payload: Option<Value>,
    files: Vec<FilePart>,
    cache: bool,
    paginate: bool,
}

impl Request {
    /// Create a request for a URI template such as `/projects/{id}`.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Default::default()
        }
    }

    /// Set the value substituted for `{name}` in the template.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Set the query parameters.
    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Set the JSON body (or the plain form fields of a multipart upload).
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Add a file part, turning the request into a multipart upload.
    #[must_use]
    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    /// Serve a GET from the response cache when possible.
    #[must_use]
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Ask for lazy server pagination on a GET.
    #[must_use]
    pub fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    pub(crate) fn template(&self) -> &str {
        &self.template
    }

    pub(crate) fn query_params(&self) -> &Query {
        &self.query
    }

    pub(crate) fn body(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub(crate) fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub(crate) fn wants_cache(&self) -> bool {
        self.cache
    }

    pub(crate) fn wants_pagination(&self) -> bool {
        self.paginate
    }

    /// Expand the URI template. Substituted values are percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns a usage error if a placeholder has no value or a brace is
    /// left unclosed.
    pub fn path(&self) -> Result<String> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| {
                TaigaError::Usage(format!("Unclosed placeholder in '{}'", self.template))
            })?;
            let name = &after[..end];
            let value = self
                .params
                .iter()
                .rev()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v)
                .ok_or_else(|| {
                    TaigaError::Usage(format!(
                        "No value for placeholder '{{{name}}}' in '{}'",
                        self.template
                    ))
                })?;
            out.push_str(&urlencoding::encode(value));
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// A successful HTTP response, fully read.
///
/// Kept as plain data so it can be cached and handed out more than once.
#[derive(Debug, Clone)]
pub struct RawResponse {
    url: String,
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl RawResponse {
    pub(crate) fn new(url: String, status: u16, headers: HeaderMap, body: String) -> Self {
        Self {
            url,
            status,
            headers,
            body,
        }
    }

    /// The URL the request was sent to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw body text.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the body is not valid JSON.
    pub fn json_value(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Decode the body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

//! Ordered result container with attribute-equality lookup.

use std::ops::Deref;

use serde::Serialize;
use serde_json::Value;

use super::descriptor::Descriptor;
use super::resource::{Field, Resource};
use crate::client::TaigaClient;
use crate::error::{Result, TaigaError};

/// Parsed instances in server order (or page order when several pages were
/// fetched).
///
/// Derefs to a slice, so indexing, `len` and `iter` work as usual.
///
/// # Example
///
/// ```no_run
/// use taigapi::{List, Query, TaigaClient};
///
/// # async fn example(client: TaigaClient) -> taigapi::Result<()> {
/// let stories = client.user_stories().list(Query::new().with("project", 1)).await?;
/// let open = stories.filter([("is_closed", false)]);
/// let first = stories.get([("subject", "Login form")]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SearchableList {
    items: Vec<Resource>,
}

impl SearchableList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of objects. `null` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an unexpected-response error if `raw` is neither an array nor
    /// `null`, or if any entry is not an object.
    pub fn parse(client: &TaigaClient, kind: &'static Descriptor, raw: Value) -> Result<Self> {
        match raw {
            Value::Null => Ok(Self::new()),
            Value::Array(items) => Self::from_values(client, kind, items),
            other => Err(TaigaError::UnexpectedResponse(format!(
                "expected a list of {}, got {other}",
                kind.endpoint
            ))),
        }
    }

    fn from_values(
        client: &TaigaClient,
        kind: &'static Descriptor,
        values: Vec<Value>,
    ) -> Result<Self> {
        values
            .into_iter()
            .map(|value| Resource::from_value(client, kind, value))
            .collect()
    }

    /// The first instance whose named fields all equal the given values.
    ///
    /// An instance without one of the fields does not match.
    pub fn get<I, K, V>(&self, filters: I) -> Option<&Resource>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Field>,
    {
        let filters = collect_filters(filters);
        self.items.iter().find(|item| matches(item, &filters))
    }

    /// Every matching instance, in order. No filters match everything.
    pub fn filter<I, K, V>(&self, filters: I) -> SearchableList
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Field>,
    {
        let filters = collect_filters(filters);
        self.items
            .iter()
            .filter(|item| matches(item, &filters))
            .cloned()
            .collect()
    }

    pub fn push(&mut self, resource: Resource) {
        self.items.push(resource);
    }

    pub fn into_vec(self) -> Vec<Resource> {
        self.items
    }
}

fn collect_filters<I, K, V>(filters: I) -> Vec<(String, Field)>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Field>,
{
    filters
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.into()))
        .collect()
}

fn matches(item: &Resource, filters: &[(String, Field)]) -> bool {
    filters
        .iter()
        .all(|(key, expected)| item.get(key) == Some(expected))
}

impl Deref for SearchableList {
    type Target = [Resource];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl From<Vec<Resource>> for SearchableList {
    fn from(items: Vec<Resource>) -> Self {
        Self { items }
    }
}

impl FromIterator<Resource> for SearchableList {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<Resource> for SearchableList {
    fn extend<I: IntoIterator<Item = Resource>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl IntoIterator for SearchableList {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchableList {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

//! Generic collection façade: the CRUD verbs every resource kind shares.

use async_trait::async_trait;
use serde_json::Value;

use super::attachment::AttachedFile;
use super::descriptor::Descriptor;
use super::resource::{check_move_to, item_request, Resource};
use super::searchable::SearchableList;
use crate::client::TaigaClient;
use crate::error::{Result, TaigaError};
use crate::pagination::{self, Page, NEXT_PAGE_HEADER};
use crate::request::{Payload, Query, Request};
use crate::traits::{Get, List};

/// All instances of one resource kind.
///
/// Obtained from the client, e.g. [`TaigaClient::projects`]. Cheap to create
/// and clone.
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
/// use taigapi::{payload, Payload, TaigaClient};
///
/// # async fn example(client: TaigaClient) -> taigapi::Result<()> {
/// let project = client
///     .projects()
///     .create(
///         payload([("name", json!("TEST")), ("description", json!("Just a test"))]),
///         Payload::new(),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    kind: &'static Descriptor,
    client: TaigaClient,
}

impl Collection {
    pub fn new(client: &TaigaClient, kind: &'static Descriptor) -> Self {
        Self {
            kind,
            client: client.clone(),
        }
    }

    pub fn kind(&self) -> &'static Descriptor {
        self.kind
    }

    /// A partial instance known only by id.
    pub fn instance(&self, id: i64) -> Resource {
        Resource::with_id(&self.client, self.kind, id)
    }

    /// Parse a JSON object as an instance of this kind.
    ///
    /// # Errors
    ///
    /// Returns an unexpected-response error if `raw` is not an object.
    pub fn parse(&self, raw: Value) -> Result<Resource> {
        Resource::from_value(&self.client, self.kind, raw)
    }

    /// Parse a JSON array as instances of this kind.
    ///
    /// # Errors
    ///
    /// Returns an unexpected-response error if `raw` is not an array.
    pub fn parse_list(&self, raw: Value) -> Result<SearchableList> {
        SearchableList::parse(&self.client, self.kind, raw)
    }

    /// Create an instance.
    ///
    /// `required` must hold exactly the kind's create fields; they win over
    /// any same-named key in `attrs`.
    ///
    /// # Errors
    ///
    /// Returns a usage error if a create field is missing or an unknown one
    /// is given, or a REST error if the server rejects the request.
    #[tracing::instrument(skip(self, required, attrs), fields(kind = self.kind.name))]
    pub async fn create(&self, required: Payload, attrs: Payload) -> Result<Resource> {
        if self.kind.is_attachment() {
            return Err(TaigaError::Usage(format!(
                "{} needs a file, use create_attachment",
                self.kind.name
            )));
        }
        self.check_required(&required)?;

        let mut body = attrs;
        body.extend(required);

        let response = self
            .client
            .post(Request::new(self.kind.endpoint).payload(body))
            .await?;
        Resource::from_response(&self.client, self.kind, &response)
    }

    /// Upload a file into this attachment collection.
    ///
    /// The upload carries the file as the `attached_file` part; `project`,
    /// `object_id` and `attrs` are sent as form fields.
    ///
    /// # Errors
    ///
    /// Returns a usage error if this is not an attachment collection or the
    /// file cannot be read, or a REST error if the upload is rejected.
    #[tracing::instrument(skip(self, file, attrs), fields(kind = self.kind.name))]
    pub async fn create_attachment(
        &self,
        project: i64,
        object_id: i64,
        file: AttachedFile,
        attrs: Payload,
    ) -> Result<Resource> {
        if !self.kind.is_attachment() {
            return Err(TaigaError::Usage(format!(
                "{} does not store attachments",
                self.kind.name
            )));
        }

        let part = file.into_part("attached_file").await?;
        let mut body = attrs;
        body.insert("project".to_string(), project.into());
        body.insert("object_id".to_string(), object_id.into());

        let request = Request::new(self.kind.endpoint).payload(body).file(part);
        let response = self.client.post(request).await?;
        Resource::from_response(&self.client, self.kind, &response)
    }

    /// Create an instance through the importer, which keeps fields such as
    /// `ref` or dates that the normal endpoint would overwrite.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the kind cannot be imported, or a REST error
    /// if the server rejects the request.
    #[tracing::instrument(skip(self, required, attrs), fields(kind = self.kind.name))]
    pub async fn import(&self, project: i64, required: Payload, attrs: Payload) -> Result<Resource> {
        let import_type = self.kind.import_type.ok_or_else(|| {
            TaigaError::Usage(format!("{} cannot be imported", self.kind.name))
        })?;

        let mut body = attrs;
        body.extend(required);
        body.insert("project".to_string(), project.into());

        let request = Request::new(format!("importer/{{project}}/{import_type}"))
            .param("project", project)
            .payload(body);
        let response = self.client.post(request).await?;
        Resource::from_response(&self.client, self.kind, &response)
    }

    /// Delete by id.
    ///
    /// # Errors
    ///
    /// Returns a usage error for kinds that need a `moveTo` id, or a REST
    /// error if the server rejects the delete.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.delete_with_query(id, Query::new()).await
    }

    /// Delete by id, moving dependents to `move_to`.
    ///
    /// # Errors
    ///
    /// Returns a REST error if the server rejects the delete.
    pub async fn delete_moving_to(&self, id: i64, move_to: i64) -> Result<()> {
        self.delete_with_query(id, Query::new().with("moveTo", move_to))
            .await
    }

    #[tracing::instrument(skip(self, query), fields(kind = self.kind.name))]
    async fn delete_with_query(&self, id: i64, query: Query) -> Result<()> {
        check_move_to(self.kind, &query)?;
        self.client
            .delete(item_request(self.kind, id).query(query))
            .await?;
        Ok(())
    }

    fn check_required(&self, required: &Payload) -> Result<()> {
        let missing: Vec<&str> = self
            .kind
            .create_fields
            .iter()
            .copied()
            .filter(|field| !required.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(TaigaError::Usage(format!(
                "{} requires {}",
                self.kind.name,
                missing.join(", ")
            )));
        }

        let unknown: Vec<&str> = required
            .keys()
            .map(String::as_str)
            .filter(|key| !self.kind.create_fields.contains(key))
            .collect();
        if !unknown.is_empty() {
            return Err(TaigaError::Usage(format!(
                "{} does not take {} as a required field",
                self.kind.name,
                unknown.join(", ")
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Get for Collection {
    type Id = i64;
    type Output = Resource;

    async fn get(&self, id: i64) -> Result<Resource> {
        tracing::debug!(kind = self.kind.name, id, "fetching");
        let response = self.client.get(item_request(self.kind, id)).await?;
        Resource::from_response(&self.client, self.kind, &response)
    }
}

#[async_trait]
impl List for Collection {
    async fn fetch(&self, query: Query, paginate: bool) -> Result<Page<Resource>> {
        let page = query.get("page").and_then(|p| p.parse().ok());
        let page_size = query.get("page_size").and_then(|s| s.parse().ok());

        let request = Request::new(self.kind.endpoint)
            .query(query)
            .paginate(paginate);
        let response = self.client.get(request).await?;

        let has_more = pagination::has_next(response.header(NEXT_PAGE_HEADER));
        let items = SearchableList::parse(&self.client, self.kind, response.json_value()?)?;
        Ok(Page::new(items.into_vec(), has_more).at(page, page_size))
    }

    fn max_pages(&self) -> Option<u32> {
        self.client.max_pages()
    }
}

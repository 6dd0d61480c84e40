//! Creating and listing instances that belong to another instance.

use chrono::NaiveDate;
use serde_json::Value;

use super::collection::Collection;
use super::descriptor::Descriptor;
use super::kinds;
use super::resource::Resource;
use super::searchable::SearchableList;
use crate::error::{Result, TaigaError};
use crate::request::{Payload, Query, Request};
use crate::traits::List;

const DATE_FORMAT: &str = "%Y-%m-%d";

impl Resource {
    fn relation_key(&self) -> Result<&'static str> {
        self.kind().relation_key.ok_or_else(|| {
            TaigaError::Usage(format!("{} has no child resources", self.kind().name))
        })
    }

    /// Create an instance of `kind` linked to this one.
    ///
    /// The link field (`project`, `user_story` or `milestone`) is filled in
    /// from this instance, and so is `project` when this instance has one.
    ///
    /// # Errors
    ///
    /// Returns a usage error if this kind has no children or a create field
    /// is missing, or a REST error if the server rejects the request.
    pub async fn add(
        &self,
        kind: &'static Descriptor,
        required: Payload,
        attrs: Payload,
    ) -> Result<Resource> {
        let key = self.relation_key()?;
        let id = self.require_id()?;
        let mut required = required;
        let mut attrs = attrs;

        if kind.create_fields.contains(&key) {
            required.insert(key.to_string(), id.into());
        } else {
            attrs.insert(key.to_string(), id.into());
        }

        if key != "project" && kind.create_fields.contains(&"project") {
            if let Some(project) = self.get_i64("project") {
                required.entry("project").or_insert_with(|| project.into());
            }
        }

        Collection::new(self.client(), kind).create(required, attrs).await
    }

    /// Instances of `kind` linked to this one.
    ///
    /// # Errors
    ///
    /// Returns a usage error if this kind has no children, or the error of
    /// any page request.
    pub async fn list_related(
        &self,
        kind: &'static Descriptor,
        filters: Query,
    ) -> Result<SearchableList> {
        let key = self.relation_key()?;
        let id = self.require_id()?;
        Collection::new(self.client(), kind)
            .list(filters.with(key, id))
            .await
    }

    /// Add a user story to this project or milestone.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub async fn add_user_story(&self, subject: &str, attrs: Payload) -> Result<Resource> {
        self.add(&kinds::USER_STORY, subject_payload(subject), attrs)
            .await
    }

    /// Add a task to this project or user story.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub async fn add_task(&self, subject: &str, status: i64, attrs: Payload) -> Result<Resource> {
        let mut required = subject_payload(subject);
        required.insert("status".to_string(), status.into());
        self.add(&kinds::TASK, required, attrs).await
    }

    /// Add an issue to this project.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub async fn add_issue(
        &self,
        subject: &str,
        priority: i64,
        status: i64,
        issue_type: i64,
        severity: i64,
        attrs: Payload,
    ) -> Result<Resource> {
        let mut required = subject_payload(subject);
        required.insert("priority".to_string(), priority.into());
        required.insert("status".to_string(), status.into());
        required.insert("type".to_string(), issue_type.into());
        required.insert("severity".to_string(), severity.into());
        self.add(&kinds::ISSUE, required, attrs).await
    }

    /// Add a milestone (sprint) to this project.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub async fn add_milestone(
        &self,
        name: &str,
        estimated_start: NaiveDate,
        estimated_finish: NaiveDate,
        attrs: Payload,
    ) -> Result<Resource> {
        let mut required = Payload::new();
        required.insert("name".to_string(), name.into());
        required.insert(
            "estimated_start".to_string(),
            estimated_start.format(DATE_FORMAT).to_string().into(),
        );
        required.insert(
            "estimated_finish".to_string(),
            estimated_finish.format(DATE_FORMAT).to_string().into(),
        );
        self.add(&kinds::MILESTONE, required, attrs).await
    }

    /// User stories of this project or milestone.
    ///
    /// # Errors
    ///
    /// See [`list_related`](Self::list_related).
    pub async fn list_user_stories(&self) -> Result<SearchableList> {
        self.list_related(&kinds::USER_STORY, Query::new()).await
    }

    /// Tasks of this project, user story or milestone.
    ///
    /// # Errors
    ///
    /// See [`list_related`](Self::list_related).
    pub async fn list_tasks(&self) -> Result<SearchableList> {
        self.list_related(&kinds::TASK, Query::new()).await
    }

    /// Progress statistics of a project or milestone.
    ///
    /// # Errors
    ///
    /// Returns a usage error for other kinds, or a REST error if the request
    /// fails.
    pub async fn stats(&self) -> Result<Value> {
        let kind = self.kind();
        if kind != &kinds::PROJECT && kind != &kinds::MILESTONE {
            return Err(TaigaError::Usage(format!("{} has no stats", kind.name)));
        }
        let request = Request::new(format!("{}/{{id}}/stats", kind.endpoint))
            .param("id", self.require_id()?);
        self.client().get(request).await?.json_value()
    }
}

fn subject_payload(subject: &str) -> Payload {
    let mut required = Payload::new();
    required.insert("subject".to_string(), subject.into());
    required
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaigaClient;

    fn client() -> TaigaClient {
        TaigaClient::with_token("http://host", "f4k3").unwrap()
    }

    #[tokio::test]
    async fn test_add_on_kind_without_children() {
        let issue = Resource::with_id(&client(), &kinds::ISSUE, 1);
        let result = issue.add_task("Task", 1, Payload::new()).await;
        assert!(matches!(result, Err(TaigaError::Usage(_))));
    }

    #[tokio::test]
    async fn test_stats_only_for_projects_and_milestones() {
        let task = Resource::with_id(&client(), &kinds::TASK, 1);
        assert!(matches!(task.stats().await, Err(TaigaError::Usage(_))));
    }

    #[tokio::test]
    async fn test_list_related_needs_id() {
        let project = Resource::new(&client(), &kinds::PROJECT);
        assert!(matches!(
            project.list_user_stories().await,
            Err(TaigaError::Usage(_))
        ));
    }
}

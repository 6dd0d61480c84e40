//! Project-wide search and the current user.

use serde::Serialize;
use serde_json::Value;

use super::kinds;
use super::resource::Resource;
use super::searchable::SearchableList;
use crate::client::TaigaClient;
use crate::error::{Result, TaigaError};
use crate::request::{Query, Request};

/// Matches of a project search, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    /// Total number of matches.
    pub count: u64,
    pub tasks: SearchableList,
    pub issues: SearchableList,
    pub user_stories: SearchableList,
    pub wikipages: SearchableList,
    pub epics: SearchableList,
}

impl TaigaClient {
    /// The authenticated user.
    ///
    /// # Errors
    ///
    /// Returns a REST error if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn me(&self) -> Result<Resource> {
        let response = self.get(Request::new("users/me")).await?;
        Resource::from_response(self, &kinds::USER, &response)
    }

    /// Search a project for `text`.
    ///
    /// # Errors
    ///
    /// Returns a REST error if the request fails, or an unexpected-response
    /// error if the body is not a search result.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, project: i64, text: &str) -> Result<SearchResult> {
        let query = Query::new().with("project", project).with("text", text);
        let mut body = self
            .get(Request::new("search").query(query))
            .await?
            .json_value()?;

        if !body.is_object() {
            return Err(TaigaError::UnexpectedResponse(format!(
                "expected a search result, got {body}"
            )));
        }
        let Some(groups) = body.as_object_mut() else {
            return Ok(SearchResult::default());
        };

        let mut take = |key: &str| groups.remove(key).unwrap_or(Value::Null);
        let count = take("count").as_u64().unwrap_or(0);
        let tasks = take("tasks");
        let issues = take("issues");
        let user_stories = take("userstories");
        let wikipages = take("wikipages");
        let epics = take("epics");

        Ok(SearchResult {
            count,
            tasks: SearchableList::parse(self, &kinds::TASK, tasks)?,
            issues: SearchableList::parse(self, &kinds::ISSUE, issues)?,
            user_stories: SearchableList::parse(self, &kinds::USER_STORY, user_stories)?,
            wikipages: SearchableList::parse(self, &kinds::WIKI_PAGE, wikipages)?,
            epics: SearchableList::parse(self, &kinds::EPIC, epics)?,
        })
    }
}

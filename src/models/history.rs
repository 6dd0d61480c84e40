//! Change history and comments.

use std::fmt;

use serde_json::Value;

use super::resource::Resource;
use crate::client::TaigaClient;
use crate::error::{Result, TaigaError};
use crate::request::{Query, Request};

/// Kinds that keep a change history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEntity {
    Issue,
    Task,
    UserStory,
    Wiki,
    Epic,
}

impl HistoryEntity {
    /// Path segment under `history/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Task => "task",
            Self::UserStory => "userstory",
            Self::Wiki => "wiki",
            Self::Epic => "epic",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "issue" => Some(Self::Issue),
            "task" => Some(Self::Task),
            "userstory" => Some(Self::UserStory),
            "wiki" => Some(Self::Wiki),
            "epic" => Some(Self::Epic),
            _ => None,
        }
    }
}

impl fmt::Display for HistoryEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to the `history` endpoints.
#[derive(Debug, Clone)]
pub struct History {
    client: TaigaClient,
}

impl History {
    pub(crate) fn new(client: &TaigaClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// History entries of one instance, newest first.
    ///
    /// # Errors
    ///
    /// Returns a REST error if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, entity: HistoryEntity, id: i64) -> Result<Value> {
        let request = Request::new(format!("history/{entity}/{{id}}")).param("id", id);
        self.client.get(request).await?.json_value()
    }

    /// Hide a comment.
    ///
    /// # Errors
    ///
    /// Returns a REST error if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete_comment(&self, entity: HistoryEntity, id: i64, comment_id: &str) -> Result<()> {
        self.comment_action(entity, id, comment_id, "delete_comment")
            .await
    }

    /// Restore a hidden comment.
    ///
    /// # Errors
    ///
    /// Returns a REST error if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn undelete_comment(
        &self,
        entity: HistoryEntity,
        id: i64,
        comment_id: &str,
    ) -> Result<()> {
        self.comment_action(entity, id, comment_id, "undelete_comment")
            .await
    }

    async fn comment_action(
        &self,
        entity: HistoryEntity,
        id: i64,
        comment_id: &str,
        action: &str,
    ) -> Result<()> {
        let request = Request::new(format!("history/{entity}/{{id}}/{action}"))
            .param("id", id)
            .query(Query::new().with("id", comment_id));
        self.client.post(request).await?;
        Ok(())
    }
}

impl Resource {
    /// History entries of this instance.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the kind keeps no history, or a REST error
    /// if the request fails.
    pub async fn history(&self) -> Result<Value> {
        let entity = self
            .kind()
            .history_entity
            .and_then(HistoryEntity::from_name)
            .ok_or_else(|| {
                TaigaError::Usage(format!("{} keeps no history", self.kind().name))
            })?;
        History::new(self.client())
            .get(entity, self.require_id()?)
            .await
    }
}

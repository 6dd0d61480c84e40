//! Delete trait for removing entities.

use async_trait::async_trait;

use crate::error::Result;
use crate::request::Query;

/// Delete an entity.
///
/// Kinds that other entities depend on (statuses, priorities, severities,
/// points, roles, issue types, swimlanes) need the id of a replacement that
/// dependents are moved to; plain [`delete`](Delete::delete) is rejected for
/// them before any request is sent.
#[async_trait]
pub trait Delete: Sync {
    /// DELETE with extra query parameters.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the kind needs `moveTo` and the query has
    /// none, or a REST error if the server rejects the delete.
    async fn delete_with_query(&self, query: Query) -> Result<()>;

    /// DELETE without query parameters.
    ///
    /// # Errors
    ///
    /// See [`delete_with_query`](Delete::delete_with_query).
    async fn delete(&self) -> Result<()> {
        self.delete_with_query(Query::new()).await
    }

    /// DELETE, moving dependents to `move_to`.
    ///
    /// # Errors
    ///
    /// Returns a REST error if the server rejects the delete.
    async fn delete_moving_to(&self, move_to: i64) -> Result<()> {
        self.delete_with_query(Query::new().with("moveTo", move_to))
            .await
    }
}

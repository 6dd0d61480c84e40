//! Update trait for modifying entities.

use async_trait::async_trait;

use crate::error::Result;
use crate::request::Payload;

/// Write local changes of an existing entity back to the server.
///
/// Both verbs refresh the local `version` from the response so that a
/// second write is not rejected as stale. A failed write leaves the local
/// instance untouched.
///
/// # Example
///
/// ```no_run
/// use taigapi::{Get, Payload, TaigaClient, Update};
///
/// # async fn example(client: TaigaClient) -> taigapi::Result<()> {
/// let mut project = client.projects().get(1).await?;
/// project.set("name", "Renamed");
/// project.update(Payload::new()).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Update {
    /// PUT every writable field, with `overrides` taking precedence.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the entity has no id, or a REST error if the
    /// server rejects the write.
    async fn update(&mut self, overrides: Payload) -> Result<()>;

    /// PATCH the named fields plus `overrides`.
    ///
    /// Only writable fields that are set locally are sent; pass `version`
    /// through `overrides`, as with [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns a usage error if the entity has no id, or a REST error if the
    /// server rejects the write.
    async fn patch(&mut self, fields: &[&str], overrides: Payload) -> Result<()>;
}

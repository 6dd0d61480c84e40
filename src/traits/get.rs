//! Get trait for fetching single entities.

use async_trait::async_trait;

use crate::error::Result;

/// Fetch a single entity by ID.
///
/// # Example
///
/// ```no_run
/// use taigapi::{Get, TaigaClient};
///
/// # async fn example(client: TaigaClient) -> taigapi::Result<()> {
/// let project = client.projects().get(1).await?;
/// println!("{project}");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Get {
    /// The ID type for this entity.
    type Id: Send;

    /// What a successful fetch yields.
    type Output;

    /// Fetch the entity by ID.
    ///
    /// # Errors
    ///
    /// Returns a REST error (404 for unknown ids) if the request fails.
    async fn get(&self, id: Self::Id) -> Result<Self::Output>;
}

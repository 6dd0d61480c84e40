//! Taiga API client library.
//!
//! A Rust library for the Taiga project management REST API. Every resource
//! kind is described by a static [`Descriptor`]; one generic [`Collection`]
//! and one generic [`Resource`] give each kind its CRUD verbs through the
//! [`Get`], [`List`], [`Update`] and [`Delete`] traits.
//!
//! # Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use taigapi::{payload, Get, List, Payload, Query, TaigaClient, Update};
//!
//! #[tokio::main]
//! async fn main() -> taigapi::Result<()> {
//!     let client = TaigaClient::new("https://api.taiga.io")?;
//!     client.auth("admin", "123123").await?;
//!
//!     // Create a project and rename it
//!     let mut project = client
//!         .projects()
//!         .create(
//!             payload([("name", json!("TEST")), ("description", json!("Just a test"))]),
//!             Payload::new(),
//!         )
//!         .await?;
//!     project.set("name", "TEST 2");
//!     project.update(Payload::new()).await?;
//!
//!     // Add a user story and list the project's stories
//!     project.add_user_story("New Story", Payload::new()).await?;
//!     let stories = project.list_user_stories().await?;
//!     println!("{} has {} stories", project, stories.len());
//!
//!     // Fetch by id, filter server-side
//!     let same = client.projects().get(project.id().unwrap_or_default()).await?;
//!     let mine = client
//!         .projects()
//!         .list(Query::new().with("member", client.me().await?.id().unwrap_or_default()))
//!         .await?;
//!     println!("{same} is one of {} projects", mine.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! [`TaigaClient::from_env`] reads:
//!
//! - `TAIGA_HOST` (optional) - defaults to `https://api.taiga.io`
//! - `TAIGA_TOKEN` (optional) - token to use without calling `auth`
//! - `TAIGA_TOKEN_TYPE` (optional) - `Bearer` or `Application`
//! - `TAIGA_TLS_VERIFY` (optional) - `false` disables certificate checks
//!
//! Everything else goes through [`ClientBuilder`].

mod cache;
mod client;
mod error;
mod models;
mod pagination;
mod request;
mod traits;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use cache::DEFAULT_CACHE_VALID_TIME;
pub use client::{ClientBuilder, TaigaClient, TokenType};
pub use error::{Result, TaigaError};
pub use pagination::{Page, Pagination, DEFAULT_PAGE_SIZE};
pub use request::{payload, FilePart, Payload, Query, RawResponse, Request};

// Re-export traits
pub use traits::{Delete, Get, List, Update};

// Re-export models
pub use models::kinds;
pub use models::{
    AttachedFile, Collection, Descriptor, Field, History, HistoryEntity, Resource, SearchResult,
    SearchableList,
};

//! Mock Taiga API server for E2E testing.
//!
//! An in-memory server that keeps state across requests, so whole workflows
//! (authenticate, create, update, attach, list) can be run against it. Every
//! resource kind in the kind table is served by the same generic handlers.
//!
//! # Example
//!
//! ```ignore
//! use taigapi::mock_server::MockServer;
//! use taigapi::{Get, TaigaClient};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = TaigaClient::new(server.url()).unwrap();
//!     client.auth("admin", "123123").await.unwrap();
//!
//!     // Server comes with default fixtures
//!     let project = client.projects().get(1).await.unwrap();
//!     assert_eq!(project.to_string(), "Test Project");
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures, ADMIN_PASSWORD, ADMIN_USERNAME};
pub use server::MockServer;
pub use state::{MockState, WriteError};

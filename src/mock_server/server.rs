//! Mock Taiga API server.
//!
//! Provides an axum-based HTTP server that simulates the Taiga API under
//! `/api/v1`.

use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;

/// A mock Taiga API server for testing.
///
/// The server runs in the background and keeps its data between requests,
/// so whole workflows can be exercised against it.
pub struct MockServer {
    url: String,
    handle: JoinHandle<()>,
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with the default fixtures.
    ///
    /// The server listens on a random available port and returns
    /// immediately. The fixtures include an `admin`/`123123` account.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_state()).await
    }

    /// Start a mock server with empty state.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Base URL of the server, to pass as the client's host.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Shared state, for inspecting or changing data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server. Aborts the server task.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            .route("/api/v1/*path", any(handlers::dispatch))
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::fixtures::{ADMIN_PASSWORD, ADMIN_USERNAME};
    use crate::{Get, List, Query, TaigaClient, TaigaError};
    use serde_json::json;

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_router_without_listener() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let state = Fixtures::default_state().with_required_token("secret");
        let router = MockServer::create_router(state.shared());

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let anonymous = router
            .oneshot(Request::get("/api/v1/projects").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_project_with_taiga_client() {
        let server = MockServer::start().await;
        let client = TaigaClient::new(server.url()).unwrap();
        client.auth(ADMIN_USERNAME, ADMIN_PASSWORD).await.unwrap();

        let project = client.projects().get(1).await.expect("Failed to get project");
        assert_eq!(project.get_str("name"), Some("Test Project"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_list_user_stories_with_taiga_client() {
        let server = MockServer::start().await;
        let client = TaigaClient::new(server.url()).unwrap();
        client.auth(ADMIN_USERNAME, ADMIN_PASSWORD).await.unwrap();

        let stories = client
            .user_stories()
            .list(Query::new().with("project", 1))
            .await
            .expect("Failed to list user stories");

        assert_eq!(stories.len(), 2);
        assert!(stories.get([("subject", "Login form")]).is_some());

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_server() {
        let server = MockServer::start_empty().await;
        let client = TaigaClient::with_token(server.url(), "any").unwrap();

        let result = client.projects().get(1).await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_custom_state() {
        let state = MockState::new()
            .with_object("projects", json!({"id": 7, "name": "My Custom Project"}))
            .with_required_token("secret");
        let server = MockServer::with_state(state).await;

        let client = TaigaClient::with_token(server.url(), "secret").unwrap();
        let project = client.projects().get(7).await.expect("Failed to get project");
        assert_eq!(project.get_str("name"), Some("My Custom Project"));

        let stranger = TaigaClient::with_token(server.url(), "wrong").unwrap();
        assert!(matches!(
            stranger.projects().get(7).await,
            Err(TaigaError::Rest { status_code: 401, .. })
        ));

        server.shutdown().await;
    }
}

//! E2E tests using the mock Taiga server.
//!
//! These tests exercise full workflows against the mock server, which keeps
//! state between requests.

#![cfg(feature = "test-server")]

use serde_json::json;
use taigapi::mock_server::{MockServer, MockState, ADMIN_PASSWORD, ADMIN_USERNAME};
use tokio_test::{assert_err, assert_ok};

use taigapi::{
    payload, AttachedFile, Delete, Get, HistoryEntity, List, Pagination, Payload, Query,
    TaigaClient, TaigaError, Update,
};

async fn logged_in(server: &MockServer) -> TaigaClient {
    let client = TaigaClient::new(server.url()).unwrap();
    client
        .auth(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("Failed to authenticate");
    client
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_server_starts_on_random_port() {
    let server1 = MockServer::start().await;
    let server2 = MockServer::start().await;

    assert_ne!(server1.url(), server2.url());

    server1.shutdown().await;
    server2.shutdown().await;
}

#[tokio::test]
async fn test_server_shutdown_is_clean() {
    let server = MockServer::start().await;
    let url = server.url().to_string();

    server.shutdown().await;

    let client = reqwest::Client::new();
    let result = client.get(format!("{}/health", url)).send().await;
    assert!(result.is_err());
}

// =============================================================================
// Auth Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_auth_me_and_refresh_workflow() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    let me = client.me().await.expect("Failed to get current user");
    assert_eq!(me.to_string(), "Administrator");

    let first_refresh = client.refresh_token_value().unwrap();
    assert_ok!(client.refresh_token(None).await);
    assert_ne!(client.refresh_token_value().unwrap(), first_refresh);

    // the consumed refresh token is rejected
    let err = assert_err!(client.refresh_token(Some(&first_refresh)).await);
    assert_eq!(err.status_code(), Some(401));

    server.shutdown().await;
}

#[tokio::test]
async fn test_wrong_password() {
    let server = MockServer::start().await;
    let client = TaigaClient::new(server.url()).unwrap();

    let err = client.auth(ADMIN_USERNAME, "nope").await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));
    assert!(!client.is_authenticated());

    server.shutdown().await;
}

// =============================================================================
// Project Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_project_story_attachment_workflow() {
    let state = MockState::new().with_user(ADMIN_USERNAME, ADMIN_PASSWORD, "Administrator");
    let server = MockServer::with_state(state).await;
    let client = logged_in(&server).await;

    // Step 1: create a project
    let mut project = client
        .projects()
        .create(
            payload([("name", json!("TEST")), ("description", json!("Just a test"))]),
            Payload::new(),
        )
        .await
        .expect("Failed to create project");
    assert_eq!(project.to_string(), "TEST");
    let project_id = project.id().unwrap();

    // Step 2: rename it, twice, relying on the refreshed version
    project.set("name", "TEST 2");
    let version = project.get_i64("version").unwrap();
    project
        .update(payload([("version", json!(version))]))
        .await
        .expect("Failed to update project");
    assert_eq!(project.get_i64("version"), Some(version + 1));

    project.set("name", "TEST 3");
    let version = project.get_i64("version").unwrap();
    project
        .update(payload([("version", json!(version))]))
        .await
        .expect("Failed to update project again");

    let fetched = client.projects().get(project_id).await.unwrap();
    assert_eq!(fetched.get_str("name"), Some("TEST 3"));

    // Step 3: add a user story
    let story = project
        .add_user_story("New Story", payload([("description", json!("As a user"))]))
        .await
        .expect("Failed to add user story");
    assert_eq!(story.get_i64("project"), Some(project_id));

    // Step 4: attach a file to it
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("design.txt");
    std::fs::write(&file_path, b"wireframes").unwrap();

    let attachment = story
        .attach(AttachedFile::path(&file_path), Payload::new())
        .await
        .expect("Failed to attach file");
    assert_eq!(attachment.get_str("name"), Some("design.txt"));
    assert_eq!(attachment.get_i64("size"), Some(10));
    assert_eq!(attachment.get_i64("object_id"), story.id());

    let attachments = story.list_attachments().await.unwrap();
    assert_eq!(attachments.len(), 1);

    // Step 5: list projects
    let projects = client.projects().list(Query::new()).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert!(projects.get([("name", "TEST 3")]).is_some());

    server.shutdown().await;
}

#[tokio::test]
async fn test_stale_version_rejected() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    let mut first = client.projects().get(1).await.unwrap();
    let mut second = client.projects().get(1).await.unwrap();

    first.set("name", "First");
    first
        .update(payload([("version", json!(1))]))
        .await
        .unwrap();

    second.set("name", "Second");
    let err = second
        .update(payload([("version", json!(1))]))
        .await
        .unwrap_err();
    assert!(matches!(err, TaigaError::Rest { status_code: 400, .. }));
    assert_eq!(err.to_string(), "The version doesn't match with the current one");

    server.shutdown().await;
}

#[tokio::test]
async fn test_patch_and_delete_workflow() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    let mut story = client.user_stories().get(10).await.unwrap();
    story.set("subject", "Login form v2");
    story.patch(&["subject"], Payload::new()).await.unwrap();

    let fetched = client.user_stories().get(10).await.unwrap();
    assert_eq!(fetched.get_str("subject"), Some("Login form v2"));

    story.delete().await.unwrap();
    let err = client.user_stories().get(10).await.unwrap_err();
    assert!(err.is_not_found());

    server.shutdown().await;
}

#[tokio::test]
async fn test_status_delete_needs_move_to() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    let statuses = client.task_statuses();
    assert!(matches!(statuses.delete(1).await, Err(TaigaError::Usage(_))));
    assert_ok!(statuses.delete_moving_to(1, 2).await);

    let remaining = statuses
        .list(Query::new().with("project", 1))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);

    server.shutdown().await;
}

// =============================================================================
// Listing Tests
// =============================================================================

#[tokio::test]
async fn test_lazy_pages_are_followed() {
    let mut state = MockState::new()
        .with_user(ADMIN_USERNAME, ADMIN_PASSWORD, "Administrator")
        .with_page_size(2);
    for i in 0..5 {
        state = state.with_object(
            "issues",
            json!({"project": 1, "subject": format!("Issue {i}")}),
        );
    }
    let server = MockServer::with_state(state).await;
    let client = logged_in(&server).await;

    let all = client.issues().list(Query::new()).await.unwrap();
    assert_eq!(all.len(), 5);

    let page = client
        .issues()
        .list(Query::new().with("page", 3).with("page_size", 2))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].get_str("subject"), Some("Issue 4"));

    let everything = client
        .issues()
        .list_with(Query::new(), Pagination::Disabled)
        .await
        .unwrap();
    assert_eq!(everything.len(), 5);

    server.shutdown().await;
}

#[tokio::test]
async fn test_related_lists() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    let project = client.projects().get(1).await.unwrap();
    let stories = project.list_user_stories().await.unwrap();
    assert_eq!(stories.len(), 2);

    let story = stories.get([("subject", "Login form")]).unwrap();
    let tasks = story.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].to_string(), "Design login form");

    let stats = project.stats().await.unwrap();
    assert_eq!(stats["total_userstories"], 2);

    server.shutdown().await;
}

// =============================================================================
// Search, History and Custom Attribute Tests
// =============================================================================

#[tokio::test]
async fn test_search_workflow() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    let result = client.search(1, "login").await.unwrap();
    assert_eq!(result.user_stories.len(), 1);
    assert_eq!(result.tasks.len(), 1);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.count, 3);

    server.shutdown().await;
}

#[tokio::test]
async fn test_comment_history_workflow() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    let mut issue = client.issues().get(30).await.unwrap();
    issue
        .update(payload([("comment", json!("Looks broken on mobile"))]))
        .await
        .unwrap();

    let history = issue.history().await.unwrap();
    let entry = &history[0];
    assert_eq!(entry["comment"], "Looks broken on mobile");
    let comment_id = entry["id"].as_str().unwrap().to_string();

    client
        .history()
        .delete_comment(HistoryEntity::Issue, 30, &comment_id)
        .await
        .unwrap();
    let history = issue.history().await.unwrap();
    assert!(!history[0]["delete_comment_date"].is_null());

    client
        .history()
        .undelete_comment(HistoryEntity::Issue, 30, &comment_id)
        .await
        .unwrap();
    let history = issue.history().await.unwrap();
    assert!(history[0]["delete_comment_date"].is_null());

    server.shutdown().await;
}

#[tokio::test]
async fn test_custom_attribute_workflow() {
    let state = taigapi::mock_server::Fixtures::default_state().with_object(
        "issue-custom-attributes",
        json!({"id": 50, "project": 1, "name": "Browser"}),
    );
    let server = MockServer::with_state(state).await;
    let client = logged_in(&server).await;

    let issue = client.issues().get(30).await.unwrap();
    let values = issue.get_attributes().await.unwrap();
    assert!(values["attributes_values"]["50"].is_null());

    let updated = issue.set_attribute(50, "Firefox", 1).await.unwrap();
    assert_eq!(updated["attributes_values"]["50"], "Firefox");
    assert_eq!(updated["version"], 2);

    let err = issue.set_attribute(51, "x", 2).await.unwrap_err();
    assert!(matches!(err, TaigaError::Usage(_)));

    server.shutdown().await;
}

#[tokio::test]
async fn test_import_keeps_ref() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    let story = client
        .user_stories()
        .import(
            1,
            payload([("subject", json!("Imported"))]),
            payload([("ref", json!(99))]),
        )
        .await
        .unwrap();
    assert_eq!(story.get_i64("ref"), Some(99));
    assert_eq!(story.get_i64("project"), Some(1));

    server.shutdown().await;
}

#[tokio::test]
async fn test_requests_need_valid_token() {
    let server = MockServer::with_state(MockState::new().with_required_token("secret")).await;

    let client = TaigaClient::with_token(server.url(), "bad").unwrap();
    let err = assert_err!(client.projects().list(Query::new()).await);
    assert_eq!(err.status_code(), Some(401));

    server.shutdown().await;
}

//! List tests: automatic page walking, explicit pages and disabled paging.

use serde_json::json;
use taigapi::{List, Pagination, Query, TaigaClient, TaigaError, TokenType, DEFAULT_PAGE_SIZE};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> TaigaClient {
    TaigaClient::with_token(&server.uri(), "f4k3").unwrap()
}

fn stories(ids: &[i64]) -> serde_json::Value {
    ids.iter()
        .map(|id| json!({"id": id, "subject": format!("Story {id}"), "project": 1}))
        .collect()
}

async fn mount_three_pages(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(query_param_is_missing("page"))
        .and(header("x-lazy-pagination", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pagination-Next", "http://host/api/v1/userstories?page=2")
                .set_body_json(stories(&[1, 2])),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pagination-Next", "http://host/api/v1/userstories?page=3")
                .set_body_json(stories(&[3, 4])),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stories(&[5])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_list_follows_pages_in_order() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server).await;

    let list = client(&mock_server)
        .user_stories()
        .list(Query::new())
        .await
        .unwrap();

    let ids: Vec<i64> = list.iter().filter_map(|story| story.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_list_keeps_filters_on_every_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .and(query_param("project", "1"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pagination-Next", "next")
                .set_body_json(json!([{"id": 1}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .and(query_param("project", "1"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tasks = client(&mock_server)
        .tasks()
        .list(Query::new().with("project", 1))
        .await
        .unwrap();
    assert_eq!(tasks.len(), 2);
}

#[tokio::test]
async fn test_empty_page_stops_walk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/issues"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pagination-Next", "next")
                .set_body_json(json!([])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let issues = client(&mock_server).issues().list(Query::new()).await.unwrap();
    assert!(issues.is_empty());
}

#[tokio::test]
async fn test_max_pages_limits_walk() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server).await;

    let client = TaigaClient::builder()
        .host(mock_server.uri())
        .token("f4k3", TokenType::Bearer)
        .max_pages(2)
        .build()
        .unwrap();

    let list = client.user_stories().list(Query::new()).await.unwrap();
    assert_eq!(list.len(), 4);
}

#[tokio::test]
async fn test_failed_page_fails_whole_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pagination-Next", "next")
                .set_body_json(stories(&[1])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"_error_message": "boom"})))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .user_stories()
        .list(Query::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "boom");
}

#[tokio::test]
async fn test_explicit_page_fetches_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "50"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pagination-Next", "next")
                .set_body_json(stories(&[51, 52])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let list = client(&mock_server)
        .user_stories()
        .list(Query::new().with("page", 2).with("page_size", 50))
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
}

#[tokio::test]
async fn test_explicit_page_with_bad_size_uses_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", DEFAULT_PAGE_SIZE.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(stories(&[1])))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server)
        .user_stories()
        .list(Query::new().with("page", 1).with("page_size", "lots"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_page_reports_continuation() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server).await;

    let page = client(&mock_server)
        .user_stories()
        .list_page(Query::new(), 2, 2)
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.page, Some(2));
    assert_eq!(page.page_size, Some(2));
    assert!(page.has_more);
}

#[tokio::test]
async fn test_non_numeric_page_is_usage_error() {
    let mock_server = MockServer::start().await;

    let result = client(&mock_server)
        .user_stories()
        .list(Query::new().with("page", "first"))
        .await;
    assert!(matches!(result, Err(TaigaError::Usage(_))));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disabled_pagination_single_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(header("x-disable-pagination", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stories(&[1, 2, 3])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let list = client(&mock_server)
        .user_stories()
        .list_with(Query::new(), Pagination::Disabled)
        .await
        .unwrap();
    assert_eq!(list.len(), 3);
}

#[tokio::test]
async fn test_client_without_pagination_never_asks_for_lazy_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/userstories"))
        .and(header("x-disable-pagination", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stories(&[1, 2, 3])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = TaigaClient::builder()
        .host(mock_server.uri())
        .token("f4k3", TokenType::Bearer)
        .pagination(false)
        .build()
        .unwrap();

    let list = client.user_stories().list(Query::new()).await.unwrap();
    assert_eq!(list.len(), 3);
}

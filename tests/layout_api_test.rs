use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use toolboard::core::session::Session;
use toolboard::layout::client::{HttpLayoutApi, LayoutApi};
use toolboard::layout::document::LayoutDocument;
use toolboard::layout::error::LayoutError;
use toolboard::layout::service::LayoutService;
use toolboard::layout::types::{ComponentInstance, ComponentType, Row};

fn api(server: &mockito::Server) -> HttpLayoutApi {
    HttpLayoutApi::with_client(reqwest::Client::new(), &server.url())
}

#[tokio::test]
async fn test_fetch_layout_forwards_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/apps/app-1/layout")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "data": {"layout": [
                    {
                        "id": "c1",
                        "type": "pieChart",
                        "queryId": "q1",
                        "queryName": "Sales",
                        "config": {}
                    }
                ]}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let layout = api(&server)
        .fetch_layout(&Session::with_token("tok-1"), "app-1")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(layout.len(), 1);
    assert_eq!(layout[0].component_type, ComponentType::PieChart);
    assert_eq!(layout[0].query_name.as_deref(), Some("Sales"));
}

#[tokio::test]
async fn test_user_id_is_forwarded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/apps/app-1/queries")
        .match_header("authorization", "Bearer tok-2")
        .match_header("x-user-id", "u-7")
        .with_status(200)
        .with_body(json!({"success": true, "data": []}).to_string())
        .create_async()
        .await;

    let session = Session {
        token: Some("tok-2".into()),
        user_id: Some("u-7".into()),
    };
    let queries = api(&server).list_queries(&session, "app-1").await.unwrap();
    mock.assert_async().await;
    assert!(queries.is_empty());
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_an_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/apps/app-1/queries/q1/execute")
        .with_status(200)
        .with_body(json!({"success": false, "message": "datasource offline"}).to_string())
        .create_async()
        .await;

    let err = api(&server)
        .execute_query(&Session::anonymous(), "app-1", "q1")
        .await
        .unwrap_err();
    match err {
        LayoutError::Api(message) => assert_eq!(message, "datasource offline"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/apps/missing/layout")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/apps/locked/layout")
        .with_status(401)
        .create_async()
        .await;
    server
        .mock("GET", "/apps/garbled/layout")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let client = api(&server);
    let session = Session::anonymous();
    assert!(matches!(
        client.fetch_layout(&session, "missing").await,
        Err(LayoutError::NotFound(_))
    ));
    assert!(matches!(
        client.fetch_layout(&session, "locked").await,
        Err(LayoutError::Unauthorized(_))
    ));
    assert!(matches!(
        client.fetch_layout(&session, "garbled").await,
        Err(LayoutError::Decode(_))
    ));
}

#[tokio::test]
async fn test_load_layout_over_http_isolates_failing_queries() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/apps/app-1/layout")
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "data": {"layout": [
                    {"id": "ok", "type": "chart", "queryId": "q-ok", "config": {}},
                    {"id": "bad", "type": "table", "queryId": "q-bad", "config": {}},
                    {"id": "txt", "type": "text", "queryId": null, "config": {"content": "Notes"}}
                ]}
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/apps/app-1/queries/q-ok/execute")
        .with_status(200)
        .with_body(
            json!({"success": true, "data": {"data": [{"region": "West", "sales": 120}]}})
                .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/apps/app-1/queries/q-bad/execute")
        .with_status(500)
        .with_body(json!({"success": false, "message": "syntax error"}).to_string())
        .create_async()
        .await;

    let service = LayoutService::new(Arc::new(api(&server)), Duration::from_secs(5));
    let document = service
        .load_layout(&Session::anonymous(), "app-1")
        .await
        .unwrap();

    assert_eq!(document.len(), 3);
    assert_eq!(document.get("ok").and_then(|c| c.rows()).map(|r| r.len()), Some(1));
    assert!(document.get("bad").unwrap().data.is_none());
    assert!(document.get("txt").unwrap().data.is_none());
}

#[tokio::test]
async fn test_save_layout_sends_layout_without_data() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/apps/app-1/layout")
        .match_body(Matcher::Json(json!({
            "layout": [
                {"id": "c1", "type": "chart", "queryId": "q1", "queryName": "Sales", "config": {}}
            ]
        })))
        .with_status(200)
        .with_body(json!({"success": true}).to_string())
        .create_async()
        .await;

    let rows: Vec<Row> = serde_json::from_value(json!([{"region": "West", "sales": 1}])).unwrap();
    let mut component = ComponentInstance::new("c1", ComponentType::Chart)
        .with_query("q1")
        .with_data(rows);
    component.query_name = Some("Sales".into());
    let document = LayoutDocument::new(vec![component]);

    let service = LayoutService::new(Arc::new(api(&server)), Duration::from_secs(5));
    service
        .save_layout(&Session::anonymous(), "app-1", &document)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(document.get("c1").unwrap().data.is_some());
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/apps/my%20app/queries")
        .with_status(200)
        .with_body(
            json!({"success": true, "data": [{"id": "q1", "name": "Revenue"}]}).to_string(),
        )
        .create_async()
        .await;

    let queries = api(&server)
        .list_queries(&Session::anonymous(), "my app")
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(queries[0].name, "Revenue");
}

//! `RestCatalogClient` and the interpreter against a mocked catalog service.

use std::sync::Arc;

use acceptance::RecordingHost;
use opendic_datafusion::{
    CatalogClient, ClientError, ErrorKind, OpenDicCatalog, RestCatalogClient, RestCatalogConfig,
};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RestCatalogClient {
    RestCatalogClient::try_new(RestCatalogConfig::new(server.uri())).unwrap()
}

#[tokio::test]
async fn test_get_decodes_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["function", "table"])))
        .expect(1)
        .mount(&server)
        .await;

    let value = client_for(&server).get("/objects").await.unwrap();
    assert_eq!(value, json!(["function", "table"]));
}

#[tokio::test]
async fn test_post_and_put_send_json_body() {
    let server = MockServer::start().await;
    let body = json!({"udo": {"type": "function", "name": "f", "alias": null, "props": null}});
    Mock::given(method("POST"))
        .and(path("/objects/function"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/objects/function/f"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.post("/objects/function", body.clone()).await.unwrap(),
        json!({"success": true})
    );
    assert_eq!(
        client.put("/objects/function/f", body).await.unwrap(),
        json!({"success": true})
    );
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/platforms/spark"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let value = client_for(&server).delete("/platforms/spark").await.unwrap();
    assert!(value.is_null());
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/platforms"))
        .and(bearer_token("secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["spark"])))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        RestCatalogClient::try_new(RestCatalogConfig::new(server.uri()).with_token("secret"))
            .unwrap();
    assert_eq!(client.get("/platforms").await.unwrap(), json!(["spark"]));
}

#[tokio::test]
async fn test_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("type not found"))
        .mount(&server)
        .await;

    let err = client_for(&server).get("/objects/missing").await.unwrap_err();
    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "type not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_json_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get("/objects").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        RestCatalogClient::try_new(RestCatalogConfig::new(format!("{}/", server.uri()))).unwrap();
    assert_eq!(client.get("/objects").await.unwrap(), json!([]));
}

#[tokio::test]
async fn test_interpreter_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/objects/function"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/objects/function/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"definition": "CREATE VIEW f AS SELECT 1"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/objects/function"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let host = Arc::new(RecordingHost::new());
    let catalog = OpenDicCatalog::new(Arc::new(client_for(&server)), host.clone());

    let response = catalog
        .sql("CREATE OPEN function f")
        .await
        .unwrap()
        .into_catalog_response()
        .unwrap();
    assert_eq!(response.executions().unwrap().len(), 1);
    assert_eq!(host.executed(), vec!["CREATE VIEW f AS SELECT 1"]);

    let err = catalog.sql("DROP OPEN function").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
}

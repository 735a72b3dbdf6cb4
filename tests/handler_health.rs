mod common;

use axum::http::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_health_endpoint_success() {
    let (server, _worker, _state) = common::test_server(common::memory_storage());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["storage"]["status"], "ok");
    assert_eq!(json["checks"]["delete_queue"]["status"], "ok");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_health_degraded_when_delete_worker_gone() {
    let (server, worker, _state) = common::test_server(common::memory_storage());
    drop(worker);

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["delete_queue"]["status"], "error");
}

#[tokio::test]
async fn test_ping() {
    let (server, _worker, _state) = common::test_server(common::memory_storage());

    let response = server.get("/ping").await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

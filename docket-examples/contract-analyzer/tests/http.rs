use axum::body::Body;
use axum::http::Request;
use contract_analyzer::build;
use docket_core::DocketConfigSnapshot;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn local_config() -> DocketConfigSnapshot {
    let mut config = contract_analyzer::config::defaults();
    config.set("storage.backend", "local");
    config.snapshot()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_ok() {
    let app = build(&local_config()).await.unwrap();

    let res = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn upload_url_points_at_the_local_object_server() {
    let app = build(&local_config()).await.unwrap();

    let res = app
        .router
        .clone()
        .oneshot(get("/get-upload-url?filename=Lease.pdf"))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let body = json_body(res).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("http://127.0.0.1:"));
    assert!(url.contains("/objects/uploads/Lease.pdf?op=write"));
}

#[tokio::test]
async fn missing_filename_is_400() {
    let app = build(&local_config()).await.unwrap();

    let res = app.router.clone().oneshot(get("/get-upload-url")).await.unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await, json!({"error": "Missing filename"}));
}

#[tokio::test]
async fn unknown_backend_is_refused() {
    let mut config = contract_analyzer::config::defaults();
    config.set("storage.backend", "ftp");
    assert!(build(&config.snapshot()).await.is_err());
}

#[tokio::test]
async fn poll_window_longer_than_read_expiry_is_refused_at_startup() {
    let mut config = contract_analyzer::config::defaults();
    config.set("storage.backend", "local");
    config.set("broker.read_expiry_secs", "10");
    assert!(build(&config.snapshot()).await.is_err());
}

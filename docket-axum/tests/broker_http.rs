use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use docket_axum::broker_app;
use docket_blob::{BlobError, BlobResult, CapabilitySigner, UrlBroker};
use docket_core::BrokerSettings;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

struct EchoSigner;

#[async_trait::async_trait]
impl CapabilitySigner for EchoSigner {
    async fn sign_put(&self, key: &str, content_type: &str, expires_in: Duration) -> BlobResult<String> {
        Ok(format!("https://store.test/{key}?op=put&ct={content_type}&ttl={}", expires_in.as_secs()))
    }

    async fn sign_get(&self, key: &str, expires_in: Duration) -> BlobResult<String> {
        Ok(format!("https://store.test/{key}?op=get&ttl={}", expires_in.as_secs()))
    }
}

struct BrokenSigner;

#[async_trait::async_trait]
impl CapabilitySigner for BrokenSigner {
    async fn sign_put(&self, _key: &str, _content_type: &str, _expires_in: Duration) -> BlobResult<String> {
        Err(BlobError::signing("InvalidAccessKeyId: AKIA-SECRET-DETAIL"))
    }

    async fn sign_get(&self, _key: &str, _expires_in: Duration) -> BlobResult<String> {
        Err(BlobError::signing("InvalidAccessKeyId: AKIA-SECRET-DETAIL"))
    }
}

fn echo_app() -> docket_axum::BrokerApp {
    broker_app(UrlBroker::new(EchoSigner, BrokerSettings::default()))
}

fn broken_app() -> docket_axum::BrokerApp {
    broker_app(UrlBroker::new(BrokenSigner, BrokerSettings::default()))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_url_is_issued_for_the_uploads_key() {
    let res = echo_app()
        .router
        .oneshot(get("/get-upload-url?filename=Lease%20Agreement%20(Final).pdf"))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://store.test/uploads/Lease Agreement (Final).pdf"));
    assert!(url.contains("ct=application/pdf"));
    assert!(url.contains("ttl=300"));
}

#[tokio::test]
async fn presigned_url_is_issued_for_the_given_key() {
    let res = echo_app()
        .router
        .oneshot(get("/get-presigned-url?key=results%2FLeaseAgreementFinal_report.txt"))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(
        body,
        json!({"url": "https://store.test/results/LeaseAgreementFinal_report.txt?op=get&ttl=120"})
    );
}

#[tokio::test]
async fn missing_filename_is_400() {
    let res = echo_app().router.oneshot(get("/get-upload-url")).await.unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await, json!({"error": "Missing filename"}));
}

#[tokio::test]
async fn empty_filename_is_400() {
    let res = echo_app()
        .router
        .oneshot(get("/get-upload-url?filename="))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await, json!({"error": "Missing filename"}));
}

#[tokio::test]
async fn missing_or_empty_key_is_400() {
    for uri in ["/get-presigned-url", "/get-presigned-url?key=", "/get-presigned-url?other=1"] {
        let res = echo_app().router.oneshot(get(uri)).await.unwrap();
        assert_eq!(res.status().as_u16(), 400, "{uri}");
        assert_eq!(json_body(res).await, json!({"error": "Missing key"}));
    }
}

#[tokio::test]
async fn signing_failure_is_500_without_backend_detail() {
    let res = broken_app()
        .router
        .oneshot(get("/get-upload-url?filename=a.pdf"))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body, json!({"error": "Failed to generate upload URL"}));

    let res = broken_app()
        .router
        .oneshot(get("/get-presigned-url?key=results/a_report.txt"))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body, json!({"error": "Failed to generate download URL"}));
    assert!(!body.to_string().contains("AKIA"));
}

#[tokio::test]
async fn request_id_is_generated_and_preserved() {
    let res = echo_app().router.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");

    let provided = HeaderValue::from_static("req-test-123");
    let res = echo_app()
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/get-upload-url?filename=a.pdf")
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let res = echo_app()
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/get-upload-url?filename=a.pdf")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers().get("access-control-allow-origin").unwrap(), "*");
}

//! Local signed-URL object server.
//!
//! Production deployments presign against S3. For local runs and tests we
//! still want capability URLs that are:
//! - real `http://` URLs a plain HTTP client can `PUT` and `GET`
//! - time-bounded
//! - bound to one operation, one key and (for writes) one content type
//! - protected by an HMAC-SHA256 signature
//!
//! Requests that fail any of those checks get `403`, a valid read of a
//! missing object gets `404`, mirroring what S3 answers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use docket_core::Operation;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::store::{CapabilitySigner, ObjectStore};
use crate::{BlobError, BlobResult};

type HmacSha256 = Hmac<Sha256>;

const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

#[derive(Clone)]
struct ServerState {
    inner: Arc<dyn ObjectStore>,
    secret: [u8; 32],
}

#[derive(Debug, serde::Deserialize)]
struct SignedQuery {
    op: String,
    expires: u64,
    #[serde(default)]
    ct: Option<String>,
    sig: String,
}

/// Object store wrapper that serves objects over HTTP via signed URLs.
pub struct LocalSignedUrlStore {
    base_url: String,
    secret: [u8; 32],
    shutdown_tx: Option<oneshot::Sender<()>>,
    _task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for LocalSignedUrlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSignedUrlStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl LocalSignedUrlStore {
    /// Wrap `inner` and start serving it on an ephemeral loopback port.
    pub async fn new(inner: Arc<dyn ObjectStore>) -> BlobResult<Self> {
        Self::bind(inner, SocketAddr::from(([127, 0, 0, 1], 0))).await
    }

    /// Wrap `inner` and start serving it on `addr`.
    pub async fn bind(inner: Arc<dyn ObjectStore>, addr: SocketAddr) -> BlobResult<Self> {
        let secret = new_secret();

        let state = ServerState { inner, secret };

        let app = Router::new()
            .route("/objects/{*key}", get(get_object).put(put_object))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let base_url = format!("http://{local_addr}");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                tracing::error!(error = %e, "local object server stopped");
            }
        });

        tracing::info!(base_url = %base_url, "local signed-url object server listening");

        Ok(Self {
            base_url,
            secret,
            shutdown_tx: Some(shutdown_tx),
            _task: task,
        })
    }

    /// Server base URL, e.g. `http://127.0.0.1:49152`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn signed_url_for(
        &self,
        operation: Operation,
        key: &str,
        expires_in: Duration,
        content_type: Option<&str>,
    ) -> BlobResult<String> {
        if key.is_empty() {
            return Err(BlobError::invalid("object key must not be empty"));
        }
        if has_dot_segment(key) {
            return Err(BlobError::invalid("object key must not contain '.' or '..' segments"));
        }

        let expires = unix_ts_seconds().saturating_add(expires_in.as_secs());
        let sig = sign(&self.secret, operation.as_str(), key, expires, content_type)?;

        let mut url = format!(
            "{}/objects/{}?op={}&expires={expires}",
            self.base_url,
            encode_key(key),
            operation.as_str()
        );
        if let Some(ct) = content_type {
            url.push_str("&ct=");
            url.push_str(&urlencoding::encode(ct));
        }
        url.push_str("&sig=");
        url.push_str(&sig);
        Ok(url)
    }
}

impl Drop for LocalSignedUrlStore {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[async_trait]
impl CapabilitySigner for LocalSignedUrlStore {
    async fn sign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> BlobResult<String> {
        self.signed_url_for(Operation::Write, key, expires_in, Some(content_type))
    }

    async fn sign_get(&self, key: &str, expires_in: Duration) -> BlobResult<String> {
        self.signed_url_for(Operation::Read, key, expires_in, None)
    }
}

async fn put_object(
    State(state): State<ServerState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(resp) = verify(&state, &key, &query, Operation::Write) {
        return resp;
    }

    let sent = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if sent != query.ct.as_deref() {
        tracing::debug!(key = %key, sent = ?sent, signed = ?query.ct, "content type does not match capability");
        return StatusCode::FORBIDDEN.into_response();
    }

    match state.inner.put(&key, sent, body).await {
        Ok(put) => {
            tracing::debug!(key = %key, size = put.size_bytes, "object stored");
            (StatusCode::OK, [(header::ETAG, format!("\"{}\"", put.etag))]).into_response()
        }
        Err(e) => {
            tracing::error!(key = %key, error = %e, "object store write failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_object(
    State(state): State<ServerState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Response {
    if let Err(resp) = verify(&state, &key, &query, Operation::Read) {
        return resp;
    }

    match state.inner.get(&key).await {
        Ok(Some(object)) => {
            let content_type = object
                .head
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], object.body).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(key = %key, error = %e, "object store read failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn verify(
    state: &ServerState,
    key: &str,
    query: &SignedQuery,
    expected: Operation,
) -> Result<(), Response> {
    if has_dot_segment(key) {
        return Err(StatusCode::FORBIDDEN.into_response());
    }

    if query.op != expected.as_str() {
        tracing::debug!(key = %key, op = %query.op, expected = %expected, "capability used for the wrong operation");
        return Err(StatusCode::FORBIDDEN.into_response());
    }

    if query.expires <= unix_ts_seconds() {
        tracing::debug!(key = %key, "capability expired");
        return Err(StatusCode::FORBIDDEN.into_response());
    }

    let Ok(provided) = URL_SAFE_NO_PAD.decode(query.sig.as_bytes()) else {
        tracing::debug!(key = %key, "capability signature is not valid base64");
        return Err(StatusCode::FORBIDDEN.into_response());
    };

    let Ok(mac) = mac_for(&state.secret, &query.op, key, query.expires, query.ct.as_deref()) else {
        return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
    };

    if mac.verify_slice(&provided).is_err() {
        tracing::debug!(key = %key, "capability signature mismatch");
        return Err(StatusCode::FORBIDDEN.into_response());
    }

    Ok(())
}

fn sign(
    secret: &[u8; 32],
    op: &str,
    key: &str,
    expires: u64,
    content_type: Option<&str>,
) -> BlobResult<String> {
    let mac = mac_for(secret, op, key, expires, content_type)?;
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

fn mac_for(
    secret: &[u8; 32],
    op: &str,
    key: &str,
    expires: u64,
    content_type: Option<&str>,
) -> BlobResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| BlobError::signing("failed to initialize hmac"))?;
    mac.update(op.as_bytes());
    mac.update(b"\n");
    mac.update(key.as_bytes());
    mac.update(b"\n");
    mac.update(expires.to_string().as_bytes());
    mac.update(b"\n");
    mac.update(content_type.unwrap_or_default().as_bytes());
    Ok(mac)
}

// URL normalization rewrites `.` and `..` path segments, so such keys never round-trip.
fn has_dot_segment(key: &str) -> bool {
    key.split('/').any(|segment| segment == "." || segment == "..")
}

// Each segment is encoded on its own so the key's slashes survive as path separators.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn unix_ts_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

fn new_secret() -> [u8; 32] {
    let a = Uuid::new_v4().as_bytes().to_owned();
    let b = Uuid::new_v4().as_bytes().to_owned();
    let mut out = [0_u8; 32];
    out[..16].copy_from_slice(&a);
    out[16..].copy_from_slice(&b);
    out
}

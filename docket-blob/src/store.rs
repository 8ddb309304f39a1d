use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::BlobResult;

/// Turns a storage key into a time-boxed, operation-scoped URL.
///
/// Implementations hold whatever credential material the backend needs; the
/// broker only ever sees the resulting URL string.
#[async_trait]
pub trait CapabilitySigner: Send + Sync {
    /// Sign a URL that allows exactly one `PUT` of `key` with `content_type`.
    async fn sign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> BlobResult<String>;

    /// Sign a URL that allows reading `key`.
    async fn sign_get(&self, key: &str, expires_in: Duration) -> BlobResult<String>;
}

#[async_trait]
impl<T> CapabilitySigner for Arc<T>
where
    T: CapabilitySigner + ?Sized,
{
    async fn sign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> BlobResult<String> {
        (**self).sign_put(key, content_type, expires_in).await
    }

    async fn sign_get(&self, key: &str, expires_in: Duration) -> BlobResult<String> {
        (**self).sign_get(key, expires_in).await
    }
}

/// Plain object storage primitives behind the local signed-URL server
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object, replacing any previous value
    async fn put(&self, key: &str, content_type: Option<&str>, body: Bytes) -> BlobResult<PutResult>;

    /// Fetch an object; `None` when the key does not exist
    async fn get(&self, key: &str) -> BlobResult<Option<StoredObject>>;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub etag: String,
    pub size_bytes: u64,
}

/// A stored object with its metadata
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub head: ObjectHead,
    pub body: Bytes,
}

/// Metadata about an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub etag: String,
    pub last_modified: i64,
}

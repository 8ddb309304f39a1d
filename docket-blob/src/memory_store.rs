use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::store::{ObjectHead, ObjectStore, PutResult, StoredObject};
use crate::BlobResult;

/// In-memory object store. Backs the local signed-URL server and tests.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, content_type: Option<&str>, body: Bytes) -> BlobResult<PutResult> {
        let etag = format!("{:x}", Sha256::digest(&body));
        let size_bytes = body.len() as u64;
        let head = ObjectHead {
            size_bytes,
            content_type: content_type.map(str::to_string),
            etag: etag.clone(),
            last_modified: unix_ts_seconds(),
        };

        self.objects
            .write()
            .await
            .insert(key.to_string(), StoredObject { head, body });

        Ok(PutResult { etag, size_bytes })
    }

    async fn get(&self, key: &str) -> BlobResult<Option<StoredObject>> {
        Ok(self.objects.read().await.get(key).cloned())
    }
}

fn unix_ts_seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

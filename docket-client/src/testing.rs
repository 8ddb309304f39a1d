//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use docket_core::{Capability, DocketError, DocketResult, Operation};

use crate::broker_client::CapabilitySource;
use crate::transport::{ObjectTransport, StorageResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub url: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Answers requests from a fixed script, in order, whatever the method.
///
/// Once the script runs dry every request gets `404`.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<DocketResult<StorageResponse>>>,
    puts: Mutex<Vec<RecordedPut>>,
    gets: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<DocketResult<StorageResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            puts: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
        }
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    fn next(&self) -> DocketResult<StorageResponse> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StorageResponse::new(404, "")))
    }
}

#[async_trait]
impl ObjectTransport for ScriptedTransport {
    async fn put(&self, url: &str, content_type: &str, body: Bytes) -> DocketResult<StorageResponse> {
        self.puts.lock().unwrap().push(RecordedPut {
            url: url.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        self.next()
    }

    async fn get(&self, url: &str) -> DocketResult<StorageResponse> {
        self.gets.lock().unwrap().push(url.to_string());
        self.next()
    }
}

/// Hands out fake capability URLs and records what was asked for.
#[derive(Default)]
pub struct RecordingSource {
    requests: Mutex<Vec<(Operation, String)>>,
    refuse_uploads: bool,
}

impl RecordingSource {
    pub fn refusing_uploads() -> Self {
        Self {
            refuse_uploads: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<(Operation, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilitySource for RecordingSource {
    async fn upload_capability(&self, filename: &str) -> DocketResult<Capability> {
        let key = docket_core::upload_key(filename);
        self.requests.lock().unwrap().push((Operation::Write, key.clone()));
        if self.refuse_uploads {
            return Err(DocketError::service("Failed to generate upload URL"));
        }
        Ok(Capability::received(Operation::Write, key.clone(), format!("https://store.test/put/{key}")))
    }

    async fn read_capability(&self, key: &str) -> DocketResult<Capability> {
        self.requests.lock().unwrap().push((Operation::Read, key.to_string()));
        Ok(Capability::received(Operation::Read, key, format!("https://store.test/get/{key}")))
    }
}

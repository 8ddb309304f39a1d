use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The single storage action a capability URL grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Write,
    Read,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Write => "write",
            Operation::Read => "read",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-boxed, operation-scoped signed URL against one storage key.
///
/// The signature is part of `url`. Capabilities are never persisted and are
/// meant to be used once, though nothing enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub operation: Operation,
    pub key: String,
    pub url: String,
    /// Known on the issuing side; `None` when rebuilt from a bare `{url}` reply.
    pub expires_in: Option<Duration>,
    /// MIME type pinned at issuance (write capabilities only).
    pub content_type: Option<String>,
}

impl Capability {
    /// Write capability as issued by a broker.
    pub fn write(
        key: impl Into<String>,
        url: impl Into<String>,
        expires_in: Duration,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            operation: Operation::Write,
            key: key.into(),
            url: url.into(),
            expires_in: Some(expires_in),
            content_type: Some(content_type.into()),
        }
    }

    /// Read capability as issued by a broker.
    pub fn read(key: impl Into<String>, url: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            operation: Operation::Read,
            key: key.into(),
            url: url.into(),
            expires_in: Some(expires_in),
            content_type: None,
        }
    }

    /// Capability rebuilt on the client from the broker's `{url}` reply.
    pub fn received(operation: Operation, key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            operation,
            key: key.into(),
            url: url.into(),
            expires_in: None,
            content_type: None,
        }
    }

    pub fn is_write(&self) -> bool {
        self.operation == Operation::Write
    }

    pub fn is_read(&self) -> bool {
        self.operation == Operation::Read
    }
}

/// Wire shape of a broker reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityResponse {
    pub url: String,
}

impl From<&Capability> for CapabilityResponse {
    fn from(capability: &Capability) -> Self {
        Self {
            url: capability.url.clone(),
        }
    }
}

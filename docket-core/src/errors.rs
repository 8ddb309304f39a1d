//! # Errors
//!
//! Docket uses one structured error for everything that crosses a component
//! boundary. Core goals:
//! - one `ErrorKind` per failure class of the submission protocol
//! - can be carried through `anyhow::Error`
//! - transport-agnostic (the HTTP crate decides how to serialize)
//!
//! Diagnostics live in `source` and in logs. Clients only ever see the
//! message, and end users only ever see [`DocketError::user_notice`].

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for Docket APIs.
pub type DocketResult<T> = std::result::Result<T, DocketError>;

/// The single notification shown to a person when a submission fails.
pub const USER_NOTICE: &str = "Upload or analysis failed. Please try again.";

/// Failure classes of the submission protocol, with their HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation, // 400
    Rejected,   // 403
    NotReady,   // 404
    Cancelled,  // 499
    Service,    // 500
    Config,     // 500
    Upload,     // 502
    Transport,  // 503
    Timeout,    // 504
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Rejected => 403,
            ErrorKind::NotReady => 404,
            ErrorKind::Cancelled => 499,
            ErrorKind::Service => 500,
            ErrorKind::Config => 500,
            ErrorKind::Upload => 502,
            ErrorKind::Transport => 503,
            ErrorKind::Timeout => 504,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Rejected => "RejectedError",
            ErrorKind::NotReady => "NotReadyError",
            ErrorKind::Cancelled => "CancelledError",
            ErrorKind::Service => "ServiceError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Upload => "UploadError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::Timeout => "TimeoutError",
        }
    }

    /// Whether a poll loop may spend another attempt after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::NotReady | ErrorKind::Transport)
    }
}

/// A structured Docket error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct DocketError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl DocketError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<AnyError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Convert into `anyhow::Error` so it flows through handler pipelines.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// A copy safe to hand to remote callers: same kind and message, no source.
    pub fn sanitize_for_client(&self) -> DocketError {
        DocketError {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }

    /// JSON body for HTTP responses: `{"error": message}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.message })
    }

    /// What a person sees. Identical for every kind.
    pub fn user_notice(&self) -> &'static str {
        USER_NOTICE
    }

    // ---- Constructors ----

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rejected, msg)
    }
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotReady, msg)
    }
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, msg)
    }
    pub fn service(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service, msg)
    }
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upload, msg)
    }
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, msg)
    }
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, msg)
    }
}

impl fmt::Display for DocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for DocketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

//! Submission state record.
//!
//! A submission moves through `Idle -> FileChosen -> Uploading -> Succeeded`
//! or ends in `Failed`. Each transition consumes the current state and
//! returns the next one, so the orchestrator threads a single value through
//! the flow instead of several call sites flipping flags.

use bytes::Bytes;

use crate::errors::DocketError;

/// A document the client intends to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Document {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    FileChosen {
        document: Document,
    },
    Uploading {
        filename: String,
    },
    Succeeded {
        filename: String,
        report: String,
    },
    Failed {
        filename: Option<String>,
        notice: String,
    },
}

impl FlowState {
    /// Choosing a file clears any previous report or failure.
    pub fn choose(self, document: Document) -> FlowState {
        FlowState::FileChosen { document }
    }

    /// Leave `FileChosen` for `Uploading`, handing the document to the caller.
    ///
    /// Any other state has nothing to submit and is returned unchanged.
    pub fn begin(self) -> Result<(Document, FlowState), FlowState> {
        match self {
            FlowState::FileChosen { document } => {
                let next = FlowState::Uploading {
                    filename: document.filename.clone(),
                };
                Ok((document, next))
            }
            other => Err(other),
        }
    }

    pub fn succeed(self, report: impl Into<String>) -> FlowState {
        FlowState::Succeeded {
            filename: self.filename().unwrap_or_default().to_string(),
            report: report.into(),
        }
    }

    /// Collapse any failure into the single user notice.
    pub fn fail(self, error: &DocketError) -> FlowState {
        FlowState::Failed {
            filename: self.filename().map(str::to_string),
            notice: error.user_notice().to_string(),
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            FlowState::Idle => None,
            FlowState::FileChosen { document } => Some(&document.filename),
            FlowState::Uploading { filename } | FlowState::Succeeded { filename, .. } => Some(filename),
            FlowState::Failed { filename, .. } => filename.as_deref(),
        }
    }

    pub fn in_progress(&self) -> bool {
        matches!(self, FlowState::Uploading { .. })
    }

    pub fn report(&self) -> Option<&str> {
        match self {
            FlowState::Succeeded { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            FlowState::Failed { notice, .. } => Some(notice),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::FileChosen { .. } => "file_chosen",
            FlowState::Uploading { .. } => "uploading",
            FlowState::Succeeded { .. } => "succeeded",
            FlowState::Failed { .. } => "failed",
        }
    }
}

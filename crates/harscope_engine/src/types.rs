use std::fmt;
use std::path::PathBuf;

pub type LoadId = u64;

/// Notifications from one ingestion run, in emission order.
///
/// Every run emits `Started` first and exactly one terminal event
/// (`Completed` or `Failed`) last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    Started { path: PathBuf },
    /// Positions `first..first + count` were appended and indexed.
    EntriesAdded { first: usize, count: usize },
    Progress { count: usize },
    Completed { total: usize },
    /// Entries ingested before the failure remain in the store.
    Failed { error: LoadError, ingested: usize },
}

impl IngestEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestEvent::Completed { .. } | IngestEvent::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub load_id: LoadId,
    pub event: IngestEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct LoadError {
    pub kind: LoadFailureKind,
    pub message: String,
}

impl LoadError {
    pub(crate) fn new(kind: LoadFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn from_json(err: &serde_json::Error) -> Self {
        let kind = if err.is_io() {
            LoadFailureKind::Io
        } else {
            LoadFailureKind::Malformed {
                line: err.line(),
                column: err.column(),
            }
        };
        Self::new(kind, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailureKind {
    /// The file could not be opened or read.
    Io,
    /// The document is not valid JSON or an entry has the wrong shape.
    Malformed { line: usize, column: usize },
    Cancelled,
    /// The ingestion task died without reporting.
    Interrupted,
}

impl fmt::Display for LoadFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailureKind::Io => write!(f, "io error"),
            LoadFailureKind::Malformed { line, column } => {
                write!(f, "malformed HAR at line {line} column {column}")
            }
            LoadFailureKind::Cancelled => write!(f, "cancelled"),
            LoadFailureKind::Interrupted => write!(f, "interrupted"),
        }
    }
}

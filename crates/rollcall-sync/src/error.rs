use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the two input documents an error or count refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Backup,
    Tabular,
}

impl SourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::Backup => "message backup",
            SourceKind::Tabular => "tabular file",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot read {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {document}: {reason}")]
    MalformedSource { document: SourceKind, reason: String },
}

impl SyncError {
    pub(crate) fn malformed(document: SourceKind, reason: impl Into<String>) -> Self {
        SyncError::MalformedSource {
            document,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

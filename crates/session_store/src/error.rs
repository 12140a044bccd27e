use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a persisted record could not be used. Callers treat every reason the
/// same way: start a fresh session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    Missing,
    Unreadable(String),
    Corrupt(String),
    Expired { age_secs: i64 },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("no record"),
            Self::Unreadable(message) => write!(f, "unreadable record: {message}"),
            Self::Corrupt(message) => write!(f, "corrupt record: {message}"),
            Self::Expired { age_secs } => write!(f, "record expired ({age_secs}s old)"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("no usable session at {path}: {reason}")]
    NotFound { path: PathBuf, reason: NotFoundReason },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize session record for {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SessionStoreError {
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>, reason: NotFoundReason) -> Self {
        Self::NotFound {
            path: path.into(),
            reason,
        }
    }

    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonSerialize {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn not_found_reason(&self) -> Option<&NotFoundReason> {
        match self {
            Self::NotFound { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

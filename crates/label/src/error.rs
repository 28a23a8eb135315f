use std::fmt;

use orka_core::{ObjectRef, SelectionError};

/// Errors raised by a Resource Accessor. Surfaced verbatim per object.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("version conflict on {target}: {message}")]
    VersionConflict { target: String, message: String },
    #[error("transport: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("invalid label spec {token:?}: {reason}")]
    InvalidSyntax { token: String, reason: String },
    #[error("can not both modify and remove label {key:?} in the same command")]
    ConflictingSpec { key: String },
    #[error("{key:?} already has a value ({old}), and --overwrite is false (wanted {new})")]
    OverwriteConflict { key: String, old: String, new: String },
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("no objects were labeled: {}", render_failures(.0))]
    AllFailed(Vec<Failure>),
}

impl LabelError {
    pub(crate) fn usage(msg: impl Into<String>) -> Self { Self::Usage(msg.into()) }

    /// Usage errors are detected before any object is touched.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::InvalidSyntax { .. } | Self::ConflictingSpec { .. })
    }
}

impl From<SelectionError> for LabelError {
    fn from(e: SelectionError) -> Self { Self::Usage(e.to_string()) }
}

/// Error recorded against one target of a batch.
#[derive(Debug)]
pub struct Failure {
    pub target: ObjectRef,
    pub error: LabelError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.error)
    }
}

fn render_failures(v: &[Failure]) -> String {
    v.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ")
}

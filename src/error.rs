use crate::{validation::ValidationOutcome, version::Version};
use std::fmt::Display;
use thiserror::Error;

pub(crate) const TASK_WITHOUT_TYPE: &str = "Task has no task type";
pub(crate) const MISSING_ROOT: &str = "Document root must be a definitions element";
pub(crate) const NO_EXECUTABLE_PROCESS: &str = "Document has no executable process";
pub(crate) const UNEXPECTED_EOF: &str = "unexpected end of document";
pub(crate) const MULTIPLE_ROOTS: &str = "document has more than one root element";
pub(crate) const STORE_LOCK_ERROR_MSG: &str = "revision store lock poisoned";

/// Result type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Machine readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Format,
    Validation,
    Conflict,
    NotFound,
    Storage,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self, f)
    }
}

/// Error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed version string: {0}")]
    VersionFormat(String),

    #[error("malformed document: {0}")]
    DocumentFormat(String),

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("{0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    File(#[from] std::io::Error),

    #[error("document failed validation with {} error(s): {}", .0.errors().len(), .0.errors().join("; "))]
    Validation(ValidationOutcome),

    #[error("version {version} is already the current version of {process_id}")]
    AlreadyCurrent { process_id: String, version: Version },

    #[error("version {version} of {process_id} is current and cannot be deactivated")]
    DeactivateCurrent { process_id: String, version: Version },

    #[error("version {version} of {process_id} is already inactive")]
    AlreadyInactive { process_id: String, version: Version },

    #[error("version {version} of {process_id} already exists")]
    DuplicateVersion { process_id: String, version: Version },

    #[error("{process_id} changed concurrently: expected base {}, found {}", display_base(.expected), display_base(.found))]
    StaleBase {
        process_id: String,
        expected: Option<Version>,
        found: Option<Version>,
    },

    #[error("{process_id} was written concurrently: expected {expected} history entries, found {found}")]
    ConcurrentWrite {
        process_id: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown process: {0}")]
    UnknownProcess(String),

    #[error("unknown version {version} of {process_id}")]
    UnknownVersion { process_id: String, version: Version },

    #[error("storage: {0}")]
    Storage(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::VersionFormat(_)
            | Error::DocumentFormat(_)
            | Error::Xml(_)
            | Error::Attribute(_)
            | Error::Escape(_)
            | Error::Utf8(_)
            | Error::File(_) => ErrorKind::Format,
            Error::Validation(_) => ErrorKind::Validation,
            Error::AlreadyCurrent { .. }
            | Error::DeactivateCurrent { .. }
            | Error::AlreadyInactive { .. }
            | Error::DuplicateVersion { .. }
            | Error::StaleBase { .. }
            | Error::ConcurrentWrite { .. } => ErrorKind::Conflict,
            Error::UnknownProcess(_) | Error::UnknownVersion { .. } => ErrorKind::NotFound,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }
}

fn display_base(version: &Option<Version>) -> String {
    version
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".into())
}

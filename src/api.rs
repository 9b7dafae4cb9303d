use crate::version::Version;
use chrono::{DateTime, Utc};
use std::fmt::Display;

/// Lifecycle status of a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevisionStatus {
    Active,
    Inactive,
    /// Stored but never activated
    Pending,
}

impl Display for RevisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevisionStatus::Active => write!(f, "ACTIVE"),
            RevisionStatus::Inactive => write!(f, "INACTIVE"),
            RevisionStatus::Pending => write!(f, "PENDING"),
        }
    }
}

/// Weight of the change between a revision and the one it was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// First revision of a process
    Created,
    Major,
    Minor,
    Patch,
}

impl Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Created => write!(f, "CREATED"),
            ChangeType::Major => write!(f, "MAJOR"),
            ChangeType::Minor => write!(f, "MINOR"),
            ChangeType::Patch => write!(f, "PATCH"),
        }
    }
}

/// Immutable snapshot of a process definition.
///
/// `status` reflects the latest history entry for the version when read from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    process_id: String,
    version: Version,
    document: String,
    name: String,
    status: RevisionStatus,
    author: String,
    created_at: DateTime<Utc>,
    comment: String,
    change: ChangeType,
}

impl Revision {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        process_id: impl Into<String>,
        version: Version,
        document: impl Into<String>,
        name: impl Into<String>,
        status: RevisionStatus,
        author: impl Into<String>,
        comment: impl Into<String>,
        change: ChangeType,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            version,
            document: document.into(),
            name: name.into(),
            status,
            author: author.into(),
            created_at: Utc::now(),
            comment: comment.into(),
            change,
        }
    }

    // Same snapshot seen with another lifecycle status
    pub(crate) fn with_status(&self, status: RevisionStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Raw document text
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> RevisionStatus {
        self.status
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn change(&self) -> ChangeType {
        self.change
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({}, {})",
            self.process_id, self.version, self.status, self.change
        )
    }
}

/// Append-only audit record of a lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    process_id: String,
    version: Version,
    status: RevisionStatus,
    author: Option<String>,
    timestamp: DateTime<Utc>,
    comment: String,
    change: ChangeType,
}

impl HistoryEntry {
    /// Entry recording that a revision was stored.
    pub fn created(revision: &Revision) -> Self {
        Self {
            process_id: revision.process_id.clone(),
            version: revision.version,
            status: revision.status,
            author: Some(revision.author.clone()),
            timestamp: revision.created_at,
            comment: revision.comment.clone(),
            change: revision.change,
        }
    }

    /// Entry recording that a revision became the current one.
    pub fn activated(revision: &Revision, comment: impl Into<String>) -> Self {
        Self::transition(revision, RevisionStatus::Active, comment)
    }

    /// Entry recording that a revision stopped being usable.
    pub fn deactivated(revision: &Revision, comment: impl Into<String>) -> Self {
        Self::transition(revision, RevisionStatus::Inactive, comment)
    }

    fn transition(revision: &Revision, status: RevisionStatus, comment: impl Into<String>) -> Self {
        Self {
            process_id: revision.process_id.clone(),
            version: revision.version,
            status,
            author: None,
            timestamp: Utc::now(),
            comment: comment.into(),
            change: revision.change,
        }
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> RevisionStatus {
        self.status
    }

    /// Creator of the revision. Lifecycle transitions have no author.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn change(&self) -> ChangeType {
        self.change
    }
}

impl Display for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.process_id, self.version, self.status)
    }
}

/// Pointer to the current revision of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentDefinition {
    process_id: String,
    version: Version,
    document: String,
    updated_at: DateTime<Utc>,
}

impl CurrentDefinition {
    pub fn new(revision: &Revision) -> Self {
        Self {
            process_id: revision.process_id.clone(),
            version: revision.version,
            document: revision.document.clone(),
            updated_at: Utc::now(),
        }
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

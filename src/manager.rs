use crate::{
    api::{ChangeType, CurrentDefinition, HistoryEntry, Revision, RevisionStatus},
    compare::{VersionComparison, classify, compare_documents, compare_versions},
    document::ParsedDocument,
    error::{Error, Result},
    normalize::{needs_normalization, normalize},
    store::{Commit, MemoryStore, RevisionStore},
    validation::validate_document,
    version::Version,
};
use log::{debug, info, warn};

/// Owns the lifecycle of every process: creation of revisions, activation and deactivation.
///
/// A process has no revision until its first successful [`create_version`](Self::create_version)
/// and from then on exactly one current revision. Every write is checked against the current
/// version and the history length it was computed from, so two writers racing on the same
/// process cannot both win.
#[derive(Debug)]
pub struct VersionManager<S = MemoryStore> {
    store: S,
    auto_normalize: bool,
    activate_on_create: bool,
}

impl VersionManager<MemoryStore> {
    /// Manager backed by a [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: RevisionStore> VersionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            auto_normalize: true,
            activate_on_create: true,
        }
    }

    /// Repair missing `inputSet`/`outputSet` elements before validation. Default `true`.
    pub fn auto_normalize(mut self, enabled: bool) -> Self {
        self.auto_normalize = enabled;
        self
    }

    /// Make every new revision current. When disabled, revisions after the first are stored
    /// as PENDING and wait for [`activate`](Self::activate). Default `true`.
    pub fn activate_on_create(mut self, enabled: bool) -> Self {
        self.activate_on_create = enabled;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate `text` and store it as the next revision of `process_id`.
    ///
    /// The first revision is 1.0.0. The change is classified against the current revision, but
    /// the bump starts from the highest stored version rather than the current one. After a
    /// rollback to 1.0.0 with 2.0.0 stored, a minor change yields 2.1.0 instead of colliding
    /// with an existing 1.1.0.
    pub fn create_version(
        &self,
        process_id: &str,
        text: &str,
        author: &str,
        comment: &str,
    ) -> Result<Revision> {
        let base = self.current_version(process_id)?;
        self.create(process_id, text, author, comment, base)
    }

    /// Like [`create_version`](Self::create_version) but only succeeds while the current
    /// version is still `expected_base`. `None` expects a process without revisions.
    pub fn create_version_on(
        &self,
        process_id: &str,
        text: &str,
        author: &str,
        comment: &str,
        expected_base: Option<Version>,
    ) -> Result<Revision> {
        self.create(process_id, text, author, comment, expected_base)
    }

    fn create(
        &self,
        process_id: &str,
        text: &str,
        author: &str,
        comment: &str,
        base: Option<Version>,
    ) -> Result<Revision> {
        let text = if self.auto_normalize && needs_normalization(text) {
            normalize(text)
        } else {
            text.to_string()
        };

        let document: ParsedDocument = text.parse()?;
        let outcome = validate_document(&document);
        if !outcome.is_valid() {
            warn!("REJECTED {process_id}: {outcome}");
            return Err(Error::Validation(outcome));
        }
        for warning in outcome.warnings() {
            warn!("{process_id}: {warning}");
        }

        // Read first, so that any write after it fails the commit
        let sequence = self.store.sequence(process_id)?;
        let current = self.store.current(process_id)?;
        let found = current.as_ref().map(CurrentDefinition::version);
        if found != base {
            return Err(Error::StaleBase {
                process_id: process_id.into(),
                expected: base,
                found,
            });
        }

        let change = match &current {
            Some(current) => {
                let previous: ParsedDocument = current.document().parse()?;
                classify(&compare_documents(&previous, &document))
            }
            None => ChangeType::Created,
        };
        let version = self
            .store
            .revisions(process_id)?
            .iter()
            .map(Revision::version)
            .max()
            .map_or(Ok(Version::INITIAL), |highest| highest.bump(change))?;
        debug!("NEXT {process_id} {version} ({change})");

        let status = if current.is_none() || self.activate_on_create {
            RevisionStatus::Active
        } else {
            RevisionStatus::Pending
        };
        let revision = Revision::new(
            process_id,
            version,
            text,
            process_name(&document).unwrap_or(process_id),
            status,
            author,
            comment,
            change,
        );

        let mut entries = Vec::with_capacity(2);
        if status == RevisionStatus::Active
            && let Some(previous) = found
        {
            let previous = self.existing(process_id, &previous)?;
            entries.push(HistoryEntry::deactivated(
                &previous,
                format!("Superseded by {version}"),
            ));
        }
        entries.push(HistoryEntry::created(&revision));

        self.store.commit(Commit {
            process_id: process_id.into(),
            base,
            sequence,
            revision: Some(revision.clone()),
            entries,
            current: (status == RevisionStatus::Active).then(|| CurrentDefinition::new(&revision)),
        })?;
        info!("CREATED {revision}");
        Ok(revision)
    }

    /// Make `version` the current revision. The previous current revision becomes INACTIVE.
    /// Returns the activated revision.
    pub fn activate(&self, process_id: &str, version: &Version) -> Result<Revision> {
        let sequence = self.store.sequence(process_id)?;
        let current = self
            .current_version(process_id)?
            .ok_or_else(|| Error::UnknownProcess(process_id.into()))?;
        let target = self.existing(process_id, version)?;
        if current == *version {
            return Err(Error::AlreadyCurrent {
                process_id: process_id.into(),
                version: *version,
            });
        }
        let previous = self.existing(process_id, &current)?;

        self.store.commit(Commit {
            process_id: process_id.into(),
            base: Some(current),
            sequence,
            revision: None,
            entries: vec![
                HistoryEntry::deactivated(&previous, format!("Replaced by {version}")),
                HistoryEntry::activated(&target, "Activated"),
            ],
            current: Some(CurrentDefinition::new(&target)),
        })?;
        info!("ACTIVATED {process_id} {version}, was {current}");
        Ok(target.with_status(RevisionStatus::Active))
    }

    /// Mark a revision that is not current as INACTIVE. Returns the deactivated revision.
    pub fn deactivate(&self, process_id: &str, version: &Version) -> Result<Revision> {
        let sequence = self.store.sequence(process_id)?;
        let current = self
            .current_version(process_id)?
            .ok_or_else(|| Error::UnknownProcess(process_id.into()))?;
        let target = self.existing(process_id, version)?;
        if current == *version {
            return Err(Error::DeactivateCurrent {
                process_id: process_id.into(),
                version: *version,
            });
        }
        if target.status() == RevisionStatus::Inactive {
            return Err(Error::AlreadyInactive {
                process_id: process_id.into(),
                version: *version,
            });
        }

        self.store.commit(Commit {
            process_id: process_id.into(),
            base: Some(current),
            sequence,
            revision: None,
            entries: vec![HistoryEntry::deactivated(&target, "Deactivated")],
            current: None,
        })?;
        info!("DEACTIVATED {process_id} {version}");
        Ok(target.with_status(RevisionStatus::Inactive))
    }

    /// Remove a process with all its revisions and history.
    pub fn delete_process(&self, process_id: &str) -> Result<()> {
        self.store.delete(process_id)?;
        info!("DELETED {process_id}");
        Ok(())
    }

    pub fn current(&self, process_id: &str) -> Result<Option<CurrentDefinition>> {
        self.store.current(process_id)
    }

    pub fn revision(&self, process_id: &str, version: &Version) -> Result<Revision> {
        self.existing(process_id, version)
    }

    /// Revisions ordered by version
    pub fn revisions(&self, process_id: &str) -> Result<Vec<Revision>> {
        self.store.revisions(process_id)
    }

    pub fn history(&self, process_id: &str) -> Result<Vec<HistoryEntry>> {
        self.store.history(process_id)
    }

    /// Differences between two stored revisions, classified as a move from `from` to `to`.
    pub fn compare_revisions(
        &self,
        process_id: &str,
        from: &Version,
        to: &Version,
    ) -> Result<VersionComparison> {
        let from = self.existing(process_id, from)?;
        let to = self.existing(process_id, to)?;
        compare_versions(from.document(), to.document())
    }

    fn current_version(&self, process_id: &str) -> Result<Option<Version>> {
        Ok(self
            .store
            .current(process_id)?
            .map(|current| current.version()))
    }

    fn existing(&self, process_id: &str, version: &Version) -> Result<Revision> {
        self.store
            .revision(process_id, version)?
            .ok_or_else(|| Error::UnknownVersion {
                process_id: process_id.into(),
                version: *version,
            })
    }
}

// Name of the first executable process, falling back to its id
fn process_name(document: &ParsedDocument) -> Option<&str> {
    document
        .processes()
        .iter()
        .find(|process| process.executable)
        .and_then(|process| process.name.as_deref().or(process.id.as_deref()))
}

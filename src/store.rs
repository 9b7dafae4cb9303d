use crate::{
    api::{CurrentDefinition, HistoryEntry, Revision, RevisionStatus},
    error::{Error, Result, STORE_LOCK_ERROR_MSG},
    version::Version,
};
use log::debug;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

/// One atomic write for a process: all of it is applied or none of it.
#[derive(Debug, Clone)]
pub struct Commit {
    pub process_id: String,
    /// Current version the write was computed from. A store holding another current
    /// version rejects the commit with [`Error::StaleBase`].
    pub base: Option<Version>,
    /// Number of history entries the write was computed from. Any write in between rejects
    /// the commit with [`Error::ConcurrentWrite`].
    pub sequence: usize,
    /// New snapshot, if the write creates one
    pub revision: Option<Revision>,
    pub entries: Vec<HistoryEntry>,
    /// New current pointer. `None` leaves the pointer as it is.
    pub current: Option<CurrentDefinition>,
}

/// Persistence of revisions, their history and the current pointer of each process.
pub trait RevisionStore: Send + Sync {
    fn current(&self, process_id: &str) -> Result<Option<CurrentDefinition>>;

    /// Snapshot of `version` with the status of its latest history entry.
    fn revision(&self, process_id: &str, version: &Version) -> Result<Option<Revision>>;

    /// All snapshots of a process ordered by version.
    fn revisions(&self, process_id: &str) -> Result<Vec<Revision>>;

    /// History entries in the order they were appended.
    fn history(&self, process_id: &str) -> Result<Vec<HistoryEntry>>;

    /// Number of history entries, `0` for an unknown process. Grows with every commit.
    fn sequence(&self, process_id: &str) -> Result<usize> {
        Ok(self.history(process_id)?.len())
    }

    fn commit(&self, commit: Commit) -> Result<()>;

    /// Remove every revision, history entry and the current pointer of a process.
    fn delete(&self, process_id: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct ProcessRecord {
    revisions: BTreeMap<Version, Revision>,
    history: Vec<HistoryEntry>,
    current: Option<CurrentDefinition>,
}

impl ProcessRecord {
    fn status(&self, version: &Version) -> Option<RevisionStatus> {
        self.history
            .iter()
            .rev()
            .find(|entry| entry.version() == *version)
            .map(HistoryEntry::status)
    }

    fn view(&self, revision: &Revision) -> Revision {
        match self.status(&revision.version()) {
            Some(status) => revision.with_status(status),
            None => revision.clone(),
        }
    }
}

/// Store keeping everything in memory. A single lock makes every commit atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    processes: Mutex<HashMap<String, ProcessRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    fn read<R>(&self, process_id: &str, f: impl FnOnce(&ProcessRecord) -> R) -> Result<Option<R>> {
        let processes = self
            .processes
            .lock()
            .map_err(|_| Error::Storage(STORE_LOCK_ERROR_MSG.into()))?;
        Ok(processes.get(process_id).map(f))
    }
}

impl RevisionStore for MemoryStore {
    fn current(&self, process_id: &str) -> Result<Option<CurrentDefinition>> {
        Ok(self
            .read(process_id, |record| record.current.clone())?
            .flatten())
    }

    fn revision(&self, process_id: &str, version: &Version) -> Result<Option<Revision>> {
        Ok(self
            .read(process_id, |record| {
                record
                    .revisions
                    .get(version)
                    .map(|revision| record.view(revision))
            })?
            .flatten())
    }

    fn revisions(&self, process_id: &str) -> Result<Vec<Revision>> {
        Ok(self
            .read(process_id, |record| {
                record
                    .revisions
                    .values()
                    .map(|revision| record.view(revision))
                    .collect()
            })?
            .unwrap_or_default())
    }

    fn history(&self, process_id: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .read(process_id, |record| record.history.clone())?
            .unwrap_or_default())
    }

    fn sequence(&self, process_id: &str) -> Result<usize> {
        Ok(self
            .read(process_id, |record| record.history.len())?
            .unwrap_or_default())
    }

    fn commit(&self, commit: Commit) -> Result<()> {
        let mut processes = self
            .processes
            .lock()
            .map_err(|_| Error::Storage(STORE_LOCK_ERROR_MSG.into()))?;

        // Check everything before touching the record
        let found = processes
            .get(&commit.process_id)
            .and_then(|record| record.current.as_ref())
            .map(CurrentDefinition::version);
        if found != commit.base {
            return Err(Error::StaleBase {
                process_id: commit.process_id,
                expected: commit.base,
                found,
            });
        }
        let sequence = processes
            .get(&commit.process_id)
            .map_or(0, |record| record.history.len());
        if sequence != commit.sequence {
            return Err(Error::ConcurrentWrite {
                process_id: commit.process_id,
                expected: commit.sequence,
                found: sequence,
            });
        }
        if let Some(revision) = &commit.revision
            && processes
                .get(&commit.process_id)
                .is_some_and(|record| record.revisions.contains_key(&revision.version()))
        {
            return Err(Error::DuplicateVersion {
                process_id: commit.process_id,
                version: revision.version(),
            });
        }

        let record = processes.entry(commit.process_id.clone()).or_default();
        if let Some(revision) = commit.revision {
            record.revisions.insert(revision.version(), revision);
        }
        record.history.extend(commit.entries);
        if let Some(current) = commit.current {
            record.current = Some(current);
        }
        debug!(
            "COMMITTED {} history: {} current: {:?}",
            commit.process_id,
            record.history.len(),
            record.current.as_ref().map(|current| current.version().to_string())
        );
        Ok(())
    }

    fn delete(&self, process_id: &str) -> Result<()> {
        let mut processes = self
            .processes
            .lock()
            .map_err(|_| Error::Storage(STORE_LOCK_ERROR_MSG.into()))?;
        processes
            .remove(process_id)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownProcess(process_id.into()))
    }
}

//! File-system backed record store.
//!
//! # Responsibility
//! - Map `(EntityKind, id)` to `<root>/<partition>/<id>.json`.
//! - Run single-record and predicate-driven batch operations.
//!
//! # Invariants
//! - Writes go through a temp file in the same directory, are synced, then
//!   renamed into place, so readers never observe a half-written record.
//! - `create` never replaces an existing record.
//! - Predicates carrying a string `id` touch at most one record.

use super::record::{
    is_valid_record_id, now_epoch_ms, Record, UpdateResult, CREATED_AT_FIELD, ID_FIELD,
    UPDATED_AT_FIELD,
};
use super::{EntityKind, StoreError, StoreResult};
use crate::query::{self, Predicate};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    CreateNew,
    Replace,
}

/// Durable record store rooted at one data directory.
///
/// Holds no cache: every call reads the file system again, so a write is
/// visible to the next read from any repository.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Data root directory.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Every record stored for `kind`, in unspecified order.
    ///
    /// Fails soft. An unreadable partition returns an empty list, and an
    /// unreadable or unparsable record file is skipped. Both cases emit a
    /// `warn` event instead of an error, so public listings keep serving
    /// whatever is readable.
    pub fn find_all(&self, kind: EntityKind) -> Vec<Record> {
        self.load_partition(kind)
            .into_iter()
            .map(|(_, record)| record)
            .collect()
    }

    /// Records of `kind` matching `predicate`.
    pub fn find_where(&self, kind: EntityKind, predicate: &Predicate) -> Vec<Record> {
        query::filter(self.find_all(kind), predicate)
    }

    /// First record of `kind` matching `predicate`, in store order.
    pub fn find_one(&self, kind: EntityKind, predicate: &Predicate) -> Option<Record> {
        let records = self.find_all(kind);
        query::find_one(&records, predicate).cloned()
    }

    /// Number of readable records of `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.load_partition(kind).len()
    }

    /// Loads one record by id.
    ///
    /// Returns `Ok(None)` when the record does not exist or `id` is not a
    /// valid record id.
    ///
    /// # Errors
    /// - `StoreError::Read` when the record file exists but cannot be read.
    /// - `StoreError::Corrupt` when it does not hold a JSON object.
    pub fn find_by_id(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Record>> {
        if !is_valid_record_id(id) {
            return Ok(None);
        }
        read_record(&self.record_path(kind, id))
    }

    /// Persists a new record and returns it as stored.
    ///
    /// Assigns a UUID v4 `id` when absent. Keeps a caller-supplied
    /// `createdAt` (import paths), otherwise stamps it. Always stamps
    /// `updatedAt`.
    ///
    /// # Errors
    /// - `StoreError::InvalidId` when a supplied `id` is not a safe file stem.
    /// - `StoreError::DuplicateId` when a record with that id exists.
    /// - `StoreError::Write` when the medium rejects the write.
    pub fn create(&self, kind: EntityKind, mut data: Record) -> StoreResult<Record> {
        let id = match data.get(ID_FIELD) {
            None | Some(Value::Null) => Uuid::new_v4().to_string(),
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(StoreError::InvalidId {
                    kind,
                    id: other.to_string(),
                })
            }
        };
        if !is_valid_record_id(&id) {
            return Err(StoreError::InvalidId { kind, id });
        }

        let now = now_epoch_ms();
        data.insert(ID_FIELD, id.clone());
        if data.created_at().is_none() {
            data.insert(CREATED_AT_FIELD, now);
        }
        data.insert(UPDATED_AT_FIELD, now);

        let path = self.record_path(kind, &id);
        if path.exists() {
            return Err(StoreError::DuplicateId { kind, id });
        }
        match write_record(&path, &data, WriteMode::CreateNew) {
            Ok(()) => {}
            Err(StoreError::Write { source, .. }) if source.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::DuplicateId { kind, id });
            }
            Err(err) => {
                error!(
                    "event=record_create module=store status=error kind={} error={}",
                    kind, err
                );
                return Err(err);
            }
        }

        info!(
            "event=record_create module=store status=ok kind={} id={}",
            kind, id
        );
        Ok(data)
    }

    /// Shallow-merges `patch` into every record matching `predicate`.
    ///
    /// A predicate with a string `id` loads only that record; all remaining
    /// predicate fields must still match. Otherwise the whole partition is
    /// scanned and each match is written individually. `id` and `createdAt`
    /// in `patch` are ignored; `updatedAt` is refreshed on every touched
    /// record.
    ///
    /// # Errors
    /// - `StoreError::Write` on the first failed write. Records written before
    ///   the failure keep their new state.
    pub fn update(
        &self,
        kind: EntityKind,
        patch: &Record,
        predicate: &Predicate,
    ) -> StoreResult<UpdateResult<Record>> {
        let targets = self.select_targets(kind, predicate)?;
        let matched_count = targets.len();
        let mut records = Vec::with_capacity(matched_count);

        for (path, mut record) in targets {
            record.merge(patch);
            record.insert(UPDATED_AT_FIELD, now_epoch_ms());
            if let Err(err) = write_record(&path, &record, WriteMode::Replace) {
                error!(
                    "event=record_update module=store status=error kind={} written={} matched={} error={}",
                    kind,
                    records.len(),
                    matched_count,
                    err
                );
                return Err(err);
            }
            records.push(record);
        }

        info!(
            "event=record_update module=store status=ok kind={} matched={}",
            kind, matched_count
        );
        Ok(UpdateResult {
            matched_count,
            records,
        })
    }

    /// Removes every record matching `predicate` and returns how many were
    /// removed. Dispatch is the same as `update`.
    ///
    /// # Errors
    /// - `StoreError::Write` on the first failed delete. Earlier deletes stay
    ///   applied.
    pub fn destroy(&self, kind: EntityKind, predicate: &Predicate) -> StoreResult<usize> {
        let targets = self.select_targets(kind, predicate)?;
        let mut removed = 0;

        for (path, _) in targets {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(source) if source.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    error!(
                        "event=record_destroy module=store status=error kind={} removed={} error={}",
                        kind, removed, source
                    );
                    return Err(StoreError::Write { path, source });
                }
            }
        }

        info!(
            "event=record_destroy module=store status=ok kind={} removed={}",
            kind, removed
        );
        Ok(removed)
    }

    fn select_targets(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
    ) -> StoreResult<Vec<(PathBuf, Record)>> {
        if let Some(id) = predicate.id_value() {
            if !is_valid_record_id(id) {
                return Ok(Vec::new());
            }
            let path = self.record_path(kind, id);
            return Ok(match read_record(&path)? {
                Some(record) if query::matches(&record, predicate) => vec![(path, record)],
                _ => Vec::new(),
            });
        }

        Ok(self
            .load_partition(kind)
            .into_iter()
            .filter(|(_, record)| query::matches(record, predicate))
            .collect())
    }

    fn load_partition(&self, kind: EntityKind) -> Vec<(PathBuf, Record)> {
        let dir = self.partition_dir(kind);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=partition_read module=store status=degraded kind={} path={} error={}",
                    kind,
                    dir.display(),
                    err
                );
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    warn!(
                        "event=partition_read module=store status=degraded kind={} error={}",
                        kind, err
                    );
                    continue;
                }
            };
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match read_record(&path) {
                Ok(Some(record)) => records.push((path, record)),
                Ok(None) => {}
                Err(err) => warn!(
                    "event=record_read module=store status=skipped kind={} error={}",
                    kind, err
                ),
            }
        }

        debug!(
            "event=partition_read module=store status=ok kind={} count={}",
            kind,
            records.len()
        );
        records
    }

    fn partition_dir(&self, kind: EntityKind) -> PathBuf {
        self.root.join(kind.partition())
    }

    fn record_path(&self, kind: EntityKind, id: &str) -> PathBuf {
        self.partition_dir(kind)
            .join(format!("{id}.{RECORD_EXTENSION}"))
    }
}

fn read_record(path: &Path) -> StoreResult<Option<Record>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(Some(Record::from(map))),
        Ok(_) => Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            message: "record is not a JSON object".to_string(),
        }),
        Err(err) => Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

fn write_record(path: &Path, record: &Record, mode: WriteMode) -> StoreResult<()> {
    let write_error = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().ok_or_else(|| {
        write_error(std::io::Error::new(
            ErrorKind::InvalidInput,
            "record path has no parent directory",
        ))
    })?;

    let mut bytes = serde_json::to_vec_pretty(record)?;
    bytes.push(b'\n');

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(&bytes).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;

    match mode {
        WriteMode::CreateNew => temp.persist_noclobber(path),
        WriteMode::Replace => temp.persist(path),
    }
    .map(|_| ())
    .map_err(|err| write_error(err.error))
}

//! File metadata repository.
//!
//! # Invariants
//! - New entries start with `downloadCount = 0`.
//! - `increment_download_count` is a read-modify-write of one record. It is
//!   not atomic against concurrent increments of the same file.

use super::collection::Collection;
use super::{RepoError, RepoResult};
use crate::model::category::CategoryId;
use crate::model::file::{FileEntry, FileId, FilePatch, NewFileEntry};
use crate::query::Predicate;
use crate::store::{Record, RecordStore, UpdateResult};

/// Typed facade over the `files` partition.
#[derive(Clone, Copy)]
pub struct FileRepository<'store> {
    files: Collection<'store, FileEntry>,
}

impl<'store> FileRepository<'store> {
    pub fn new(store: &'store RecordStore) -> Self {
        Self {
            files: Collection::new(store),
        }
    }

    pub fn create(&self, new_file: &NewFileEntry) -> RepoResult<FileEntry> {
        self.files.insert(new_file.to_record()?)
    }

    pub fn find_all(&self, predicate: &Predicate) -> RepoResult<Vec<FileEntry>> {
        self.files.find_all(predicate)
    }

    /// Raw match count; undecodable file records are counted too.
    pub fn count_where(&self, predicate: &Predicate) -> usize {
        self.files.count_where(predicate)
    }

    pub fn find_one(&self, predicate: &Predicate) -> RepoResult<Option<FileEntry>> {
        self.files.find_one(predicate)
    }

    pub fn find_by_pk(&self, id: FileId) -> RepoResult<Option<FileEntry>> {
        self.files.find_by_pk(id)
    }

    pub fn update(
        &self,
        patch: &FilePatch,
        predicate: &Predicate,
    ) -> RepoResult<UpdateResult<FileEntry>> {
        self.files.update(&patch.to_record()?, predicate)
    }

    pub fn destroy(&self, predicate: &Predicate) -> RepoResult<usize> {
        self.files.destroy(predicate)
    }

    /// Adds one to `downloadCount` and returns the updated entry.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the file does not exist, including when
    ///   it disappears between the read and the write.
    pub fn increment_download_count(&self, id: FileId) -> RepoResult<FileEntry> {
        let current = self.files.get(id)?;

        let mut patch = Record::new();
        patch.insert(
            FileEntry::DOWNLOAD_COUNT,
            current.download_count.saturating_add(1),
        );
        self.files
            .update(&patch, &Predicate::by_id(id))?
            .records
            .into_iter()
            .next()
            .ok_or(RepoError::NotFound(id))
    }

    pub fn count(&self) -> usize {
        self.files.count()
    }

    /// Predicate selecting files attached to `category_id`.
    pub fn in_category(category_id: CategoryId) -> Predicate {
        Predicate::new().eq(FileEntry::CATEGORY_ID, category_id.to_string())
    }
}

//! Generic typed access to one record partition.
//!
//! # Invariants
//! - Single-record reads reject records that do not decode (`InvalidData`).
//! - `find_all` skips such records with a `warn` event, matching the store's
//!   fail-soft listing policy. Integrity checks must not use it: they read
//!   through `find_all_strict` or `count_where`, which never hide a record.

use super::{RepoError, RepoResult};
use crate::model::Entity;
use crate::query::Predicate;
use crate::store::{Record, RecordStore, UpdateResult};
use log::warn;
use std::marker::PhantomData;
use uuid::Uuid;

/// Typed view over the partition of `T`.
pub struct Collection<'store, T> {
    store: &'store RecordStore,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Collection<'_, T> {}

impl<'store, T: Entity> Collection<'store, T> {
    pub fn new(store: &'store RecordStore) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Persists a prepared record and returns it decoded.
    pub fn insert(&self, record: Record) -> RepoResult<T> {
        let stored = self.store.create(T::KIND, record)?;
        decode(&stored)
    }

    /// All decodable entities matching `predicate`, in store order.
    pub fn find_all(&self, predicate: &Predicate) -> RepoResult<Vec<T>> {
        Ok(self
            .store
            .find_where(T::KIND, predicate)
            .iter()
            .filter_map(|record| match decode::<T>(record) {
                Ok(entity) => Some(entity),
                Err(err) => {
                    warn!(
                        "event=entity_decode module=repo status=skipped kind={} error={}",
                        T::KIND,
                        err
                    );
                    None
                }
            })
            .collect())
    }

    /// Every entity matching `predicate`, failing on the first record that
    /// does not decode.
    ///
    /// # Errors
    /// - `RepoError::InvalidData` naming the undecodable record.
    pub fn find_all_strict(&self, predicate: &Predicate) -> RepoResult<Vec<T>> {
        self.store
            .find_where(T::KIND, predicate)
            .iter()
            .map(decode::<T>)
            .collect()
    }

    /// Number of stored records matching `predicate`, decodable or not.
    pub fn count_where(&self, predicate: &Predicate) -> usize {
        self.store.find_where(T::KIND, predicate).len()
    }

    /// First decodable entity matching `predicate`, in store order.
    pub fn find_one(&self, predicate: &Predicate) -> RepoResult<Option<T>> {
        Ok(self.find_all(predicate)?.into_iter().next())
    }

    /// Loads one entity by primary key.
    pub fn find_by_pk(&self, id: Uuid) -> RepoResult<Option<T>> {
        self.store
            .find_by_id(T::KIND, &id.to_string())?
            .map(|record| decode(&record))
            .transpose()
    }

    /// Loads one entity by primary key or fails with `NotFound`.
    pub fn get(&self, id: Uuid) -> RepoResult<T> {
        self.find_by_pk(id)?.ok_or(RepoError::NotFound(id))
    }

    /// Merges `patch` into every record matching `predicate`.
    pub fn update(&self, patch: &Record, predicate: &Predicate) -> RepoResult<UpdateResult<T>> {
        self.store
            .update(T::KIND, patch, predicate)?
            .try_map(|record| decode(&record))
    }

    /// Removes every record matching `predicate`.
    pub fn destroy(&self, predicate: &Predicate) -> RepoResult<usize> {
        Ok(self.store.destroy(T::KIND, predicate)?)
    }

    pub fn count(&self) -> usize {
        self.store.count(T::KIND)
    }
}

fn decode<T: Entity>(record: &Record) -> RepoResult<T> {
    record.to_entity::<T>().map_err(|err| {
        RepoError::InvalidData(format!(
            "{} record `{}`: {err}",
            T::KIND,
            record.id().unwrap_or("<missing id>")
        ))
    })
}

//! Process-wide entry point into the core.
//!
//! A `CoreContext` is built once at start and hands out repositories and
//! services that borrow its store. It is `Send + Sync`, so a caller can put
//! it behind an `Arc`.

use crate::config::CoreConfig;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::file_repo::FileRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::account_service::AccountService;
use crate::service::catalog_service::CatalogService;
use crate::service::hierarchy_service::HierarchyService;
use crate::store::{open_store, RecordStore, StoreResult};
use std::path::Path;

#[derive(Debug)]
pub struct CoreContext {
    store: RecordStore,
}

impl CoreContext {
    pub fn open(config: &CoreConfig) -> StoreResult<Self> {
        Self::open_at(&config.data_dir)
    }

    /// Opens (and bootstraps) the store rooted at `data_dir`.
    pub fn open_at(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            store: open_store(data_dir)?,
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.store)
    }

    pub fn categories(&self) -> CategoryRepository<'_> {
        CategoryRepository::new(&self.store)
    }

    pub fn files(&self) -> FileRepository<'_> {
        FileRepository::new(&self.store)
    }

    pub fn hierarchy(&self) -> HierarchyService<'_> {
        HierarchyService::new(self.categories(), self.files())
    }

    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(self.users())
    }

    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.categories(), self.files())
    }
}

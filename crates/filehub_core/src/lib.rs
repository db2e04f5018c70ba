//! Core storage and domain logic for the FileHub portal.
//! This crate is the single source of truth for record layout and
//! category-forest invariants.

pub mod config;
pub mod context;
pub mod logging;
pub mod model;
pub mod password;
pub mod query;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{AdminSeed, ConfigError, CoreConfig};
pub use context::CoreContext;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId, CategoryPatch, NewCategory};
pub use model::file::{FileEntry, FileId, FilePatch, NewFileEntry};
pub use model::user::{NewUser, Role, User, UserId, UserPatch};
pub use model::validation::ValidationError;
pub use query::Predicate;
pub use repo::{RepoError, RepoResult};
pub use service::catalog_service::{CatalogError, FileListQuery, FilePage, Viewer};
pub use service::hierarchy_service::HierarchyError;
pub use store::{EntityKind, Record, RecordStore, StoreError, StoreResult, UpdateResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

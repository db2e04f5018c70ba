//! Typed repositories over the record store.
//!
//! # Responsibility
//! - Translate typed inputs and patches into records and back.
//! - Apply entity-specific transforms: validation, defaults, password
//!   hashing, uniqueness checks.
//!
//! # Invariants
//! - Repositories cache nothing; every call re-reads the store.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to store transport errors.
//! - Category repositories do not protect the forest invariant. That is
//!   `HierarchyService`'s job.

use crate::model::validation::ValidationError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod category_repo;
pub mod collection;
pub mod file_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Store(StoreError),
    NotFound(Uuid),
    /// A stored record does not deserialize into its entity shape.
    InvalidData(String),
    /// Password hashing or hash parsing failed.
    PasswordHash(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::PasswordHash(message) => write!(f, "password hash error: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::PasswordHash(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<argon2::password_hash::Error> for RepoError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(value.to_string())
    }
}

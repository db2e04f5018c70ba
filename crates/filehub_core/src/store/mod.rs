//! Embedded document storage: one JSON file per record, one directory per
//! entity type.
//!
//! # Responsibility
//! - Own the on-disk record layout exclusively.
//! - Provide atomic single-record create/update/delete and predicate-driven
//!   batch operations.
//!
//! # Invariants
//! - A record file is always either the previous or the next full version,
//!   never a partial write (temp file + rename).
//! - `id` is immutable once stored; `createdAt` is set once; `updatedAt` is
//!   refreshed on every write.
//! - Batch operations are NOT atomic across records. A failure midway leaves
//!   the records already written in place.
//!
//! # Read failure policy
//! `RecordStore::find_all` fails soft: an unreadable partition yields an empty
//! list and an unreadable record file is skipped, each with a `warn` event.
//! Single-record reads propagate errors instead.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod fs_store;
mod open;
pub mod record;

pub use fs_store::RecordStore;
pub use open::open_store;
pub use record::{now_epoch_ms, Record, UpdateResult};

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable partition selector. Each kind maps to its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Category,
    File,
}

impl EntityKind {
    /// All partitions, in bootstrap order.
    pub const ALL: [EntityKind; 3] = [Self::User, Self::Category, Self::File];

    /// Directory name of this partition under the data root.
    pub fn partition(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Category => "categories",
            Self::File => "files",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.partition())
    }
}

/// Record store failures.
#[derive(Debug)]
pub enum StoreError {
    /// Identifier cannot be used as a record file stem.
    InvalidId { kind: EntityKind, id: String },
    /// A record with this id already exists.
    DuplicateId { kind: EntityKind, id: String },
    /// An existing record file could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An existing record file holds data that is not a JSON object.
    Corrupt { path: PathBuf, message: String },
    /// A record could not be serialized.
    Serialize(serde_json::Error),
    /// The durable medium rejected a write or delete. Fatal, never retried.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Data directory bootstrap failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId { kind, id } => write!(f, "invalid {kind} record id `{id}`"),
            Self::DuplicateId { kind, id } => write!(f, "{kind} record already exists: {id}"),
            Self::Read { path, source } => {
                write!(f, "failed to read record `{}`: {source}", path.display())
            }
            Self::Corrupt { path, message } => {
                write!(f, "corrupt record `{}`: {message}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to serialize record: {err}"),
            Self::Write { path, source } => {
                write!(f, "failed to write record `{}`: {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "storage bootstrap failed at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } | Self::Io { source, .. } => {
                Some(source)
            }
            Self::Serialize(err) => Some(err),
            Self::InvalidId { .. } | Self::DuplicateId { .. } | Self::Corrupt { .. } => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

//! Typed entity shapes layered over schema-less records.
//!
//! # Responsibility
//! - Define the user/category/file entities and their create/patch inputs.
//! - Own field-level validation shared by repositories.
//!
//! # Invariants
//! - Entities serialize with camelCase field names, matching the on-disk
//!   record layout.
//! - Every entity carries a stable UUID identifier and epoch-ms timestamps.
//! - Entities reference each other by id only, never by embedding.

use crate::store::EntityKind;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod category;
pub mod file;
pub mod user;
pub mod validation;

/// Typed view over one record partition.
pub trait Entity: Serialize + DeserializeOwned {
    /// Partition this entity is stored in.
    const KIND: EntityKind;
}

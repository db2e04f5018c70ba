//! Downloadable file metadata entity.
//!
//! The bytes live wherever the upload transport put them (`storage_path`);
//! this record only describes them.
//!
//! # Invariants
//! - `category_id` always refers to a category. Checked by callers that
//!   register or move files, not by the record itself.
//! - `download_count` only grows under normal operation.

use super::category::CategoryId;
use super::user::UserId;
use super::validation::{required_text, ValidationError};
use super::Entity;
use crate::store::{EntityKind, Record};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type FileId = Uuid;

pub const FILENAME_MAX: usize = 200;
pub const ORIGINAL_NAME_MAX: usize = 255;
pub const FILE_DESCRIPTION_MAX: usize = 1000;
pub const STORAGE_PATH_MAX: usize = 1024;

fn default_public() -> bool {
    true
}

/// Stored file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: FileId,
    /// Name assigned by the upload transport.
    pub filename: String,
    /// Name the uploader's client sent.
    pub original_name: String,
    pub description: String,
    pub size_bytes: u64,
    pub storage_path: String,
    #[serde(default)]
    pub download_count: u64,
    pub category_id: CategoryId,
    pub uploaded_by_id: UserId,
    #[serde(default = "default_public")]
    pub is_public: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FileEntry {
    pub const FILENAME: &'static str = "filename";
    pub const ORIGINAL_NAME: &'static str = "originalName";
    pub const DESCRIPTION: &'static str = "description";
    pub const SIZE_BYTES: &'static str = "sizeBytes";
    pub const STORAGE_PATH: &'static str = "storagePath";
    pub const DOWNLOAD_COUNT: &'static str = "downloadCount";
    pub const CATEGORY_ID: &'static str = "categoryId";
    pub const UPLOADED_BY_ID: &'static str = "uploadedById";
    pub const IS_PUBLIC: &'static str = "isPublic";
}

impl Entity for FileEntry {
    const KIND: EntityKind = EntityKind::File;
}

/// Input for registering an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileEntry {
    pub filename: String,
    pub original_name: String,
    pub description: String,
    pub size_bytes: u64,
    pub storage_path: String,
    pub category_id: CategoryId,
    pub uploaded_by_id: UserId,
    pub is_public: bool,
}

impl NewFileEntry {
    /// Validates fields and returns the record to store, with
    /// `downloadCount = 0`.
    pub(crate) fn to_record(&self) -> Result<Record, ValidationError> {
        let mut record = Record::new();
        record.insert(
            FileEntry::FILENAME,
            required_text("filename", &self.filename, FILENAME_MAX)?,
        );
        record.insert(
            FileEntry::ORIGINAL_NAME,
            required_text("originalName", &self.original_name, ORIGINAL_NAME_MAX)?,
        );
        record.insert(
            FileEntry::DESCRIPTION,
            required_text("description", &self.description, FILE_DESCRIPTION_MAX)?,
        );
        record.insert(FileEntry::SIZE_BYTES, self.size_bytes);
        record.insert(
            FileEntry::STORAGE_PATH,
            required_text("storagePath", &self.storage_path, STORAGE_PATH_MAX)?,
        );
        record.insert(FileEntry::DOWNLOAD_COUNT, 0_u64);
        record.insert(FileEntry::CATEGORY_ID, self.category_id.to_string());
        record.insert(FileEntry::UPLOADED_BY_ID, self.uploaded_by_id.to_string());
        record.insert(FileEntry::IS_PUBLIC, self.is_public);
        Ok(record)
    }
}

/// Partial file metadata update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePatch {
    pub original_name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub is_public: Option<bool>,
}

impl FilePatch {
    pub fn visibility(is_public: bool) -> Self {
        Self {
            is_public: Some(is_public),
            ..Self::default()
        }
    }

    pub fn move_to(category_id: CategoryId) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    pub(crate) fn to_record(&self) -> Result<Record, ValidationError> {
        let mut record = Record::new();
        if let Some(original_name) = &self.original_name {
            record.insert(
                FileEntry::ORIGINAL_NAME,
                required_text("originalName", original_name, ORIGINAL_NAME_MAX)?,
            );
        }
        if let Some(description) = &self.description {
            record.insert(
                FileEntry::DESCRIPTION,
                required_text("description", description, FILE_DESCRIPTION_MAX)?,
            );
        }
        if let Some(category_id) = self.category_id {
            record.insert(FileEntry::CATEGORY_ID, category_id.to_string());
        }
        if let Some(is_public) = self.is_public {
            record.insert(FileEntry::IS_PUBLIC, is_public);
        }
        Ok(record)
    }
}

//! File catalog use-cases.
//!
//! # Responsibility
//! - Keep file records attached to existing categories.
//! - Apply viewer visibility: private files exist only for admins.
//! - Provide paged listings and download accounting.
//!
//! # Invariants
//! - Registering or moving a file requires the target category to exist.
//! - Listings are sorted by `createdAt DESC, id ASC`.
//! - Page size defaults to 10 and clamps to `1..=100`.

use crate::model::category::CategoryId;
use crate::model::file::{FileEntry, FileId, FilePatch, NewFileEntry};
use crate::model::user::Role;
use crate::query::Predicate;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::file_repo::FileRepository;
use crate::repo::RepoError;
use crate::store::UpdateResult;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FILES_DEFAULT_LIMIT: u32 = 10;
pub const FILES_LIMIT_MAX: u32 = 100;

/// Who is looking at the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Viewer {
    #[default]
    Anonymous,
    Member,
    Admin,
}

impl Viewer {
    pub fn from_role(role: Option<Role>) -> Self {
        match role {
            None => Self::Anonymous,
            Some(Role::User) => Self::Member,
            Some(Role::Admin) => Self::Admin,
        }
    }

    pub fn can_see(self, file: &FileEntry) -> bool {
        file.is_public || self == Self::Admin
    }
}

/// Catalog use-case errors.
#[derive(Debug)]
pub enum CatalogError {
    FileNotFound(FileId),
    CategoryNotFound(CategoryId),
    /// The viewer may not see this file.
    Forbidden(FileId),
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(id) => write!(f, "file not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::Forbidden(id) => write!(f, "access to file denied: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::FileNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Listing options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListQuery {
    pub viewer: Viewer,
    pub category_id: Option<CategoryId>,
    /// 1-based page number. `0` is treated as `1`.
    pub page: u32,
    /// Page size. Defaults to 10 and clamps to 100.
    pub limit: Option<u32>,
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePage {
    pub items: Vec<FileEntry>,
    /// Matches across all pages.
    pub total: usize,
    pub total_pages: usize,
    pub current_page: u32,
    pub applied_limit: u32,
}

/// Catalog facade over category and file repositories.
pub struct CatalogService<'store> {
    categories: CategoryRepository<'store>,
    files: FileRepository<'store>,
}

impl<'store> CatalogService<'store> {
    pub fn new(categories: CategoryRepository<'store>, files: FileRepository<'store>) -> Self {
        Self { categories, files }
    }

    /// Records an uploaded file in an existing category.
    pub fn register_file(&self, new_file: &NewFileEntry) -> Result<FileEntry, CatalogError> {
        self.require_category(new_file.category_id)?;
        let file = self.files.create(new_file)?;
        info!(
            "event=file_register module=catalog status=ok id={} category={} size_bytes={}",
            file.id, file.category_id, file.size_bytes
        );
        Ok(file)
    }

    /// Lists files visible to the viewer, newest first.
    pub fn list_files(&self, query: &FileListQuery) -> Result<FilePage, CatalogError> {
        let mut predicate = Predicate::new();
        if query.viewer != Viewer::Admin {
            predicate = predicate.eq(FileEntry::IS_PUBLIC, true);
        }
        if let Some(category_id) = query.category_id {
            predicate = predicate.eq(FileEntry::CATEGORY_ID, category_id.to_string());
        }

        let mut files = self.files.find_all(&predicate)?;
        files.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });

        let applied_limit = normalize_limit(query.limit);
        let current_page = query.page.max(1);
        let limit = applied_limit as usize;
        let total = files.len();
        let items = files
            .into_iter()
            .skip((current_page as usize - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Ok(FilePage {
            items,
            total,
            total_pages: total.div_ceil(limit),
            current_page,
            applied_limit,
        })
    }

    /// Loads one file, hiding private files from non-admins.
    pub fn get_file(&self, id: FileId, viewer: Viewer) -> Result<FileEntry, CatalogError> {
        let file = self
            .files
            .find_by_pk(id)?
            .ok_or(CatalogError::FileNotFound(id))?;
        if !viewer.can_see(&file) {
            return Err(CatalogError::Forbidden(id));
        }
        Ok(file)
    }

    /// Checks visibility and bumps the download counter.
    ///
    /// Returns the updated entry; the caller streams `storage_path`.
    pub fn record_download(&self, id: FileId, viewer: Viewer) -> Result<FileEntry, CatalogError> {
        self.get_file(id, viewer)?;
        Ok(self.files.increment_download_count(id)?)
    }

    /// Updates one file's metadata. A category change must target an
    /// existing category.
    pub fn update_file(&self, id: FileId, patch: &FilePatch) -> Result<FileEntry, CatalogError> {
        if let Some(category_id) = patch.category_id {
            self.require_category(category_id)?;
        }
        self.files
            .update(patch, &Predicate::by_id(id))?
            .records
            .into_iter()
            .next()
            .ok_or(CatalogError::FileNotFound(id))
    }

    /// Removes one file record and returns it so the caller can delete the
    /// stored bytes.
    pub fn delete_file(&self, id: FileId) -> Result<FileEntry, CatalogError> {
        let file = self
            .files
            .find_by_pk(id)?
            .ok_or(CatalogError::FileNotFound(id))?;
        if self.files.destroy(&Predicate::by_id(id))? == 0 {
            return Err(CatalogError::FileNotFound(id));
        }
        info!("event=file_delete module=catalog status=ok id={}", id);
        Ok(file)
    }

    /// Reattaches every file of `from` to `to`. Not atomic across files.
    pub fn move_files(
        &self,
        from: CategoryId,
        to: CategoryId,
    ) -> Result<UpdateResult<FileEntry>, CatalogError> {
        self.require_category(to)?;
        let result = self
            .files
            .update(&FilePatch::move_to(to), &FileRepository::in_category(from))?;
        info!(
            "event=file_move module=catalog status=ok from={} to={} matched={}",
            from, to, result.matched_count
        );
        Ok(result)
    }

    /// Sets `isPublic` on every file attached to `category_id`. Not atomic
    /// across files.
    pub fn set_category_visibility(
        &self,
        category_id: CategoryId,
        is_public: bool,
    ) -> Result<UpdateResult<FileEntry>, CatalogError> {
        Ok(self.files.update(
            &FilePatch::visibility(is_public),
            &FileRepository::in_category(category_id),
        )?)
    }

    fn require_category(&self, category_id: CategoryId) -> Result<(), CatalogError> {
        match self.categories.find_by_pk(category_id)? {
            Some(_) => Ok(()),
            None => Err(CatalogError::CategoryNotFound(category_id)),
        }
    }
}

fn normalize_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(FILES_DEFAULT_LIMIT)
        .clamp(1, FILES_LIMIT_MAX)
}

//! Category hierarchy integrity service.
//!
//! # Responsibility
//! - Compute ancestor paths over the category forest.
//! - Gate every category mutation: parent existence, cycle prevention and
//!   delete guards against children and attached files.
//!
//! # Invariants
//! - Parent links form a forest. Any ancestor walk is bounded by the total
//!   category count; exceeding it or revisiting an id reports
//!   `CorruptAncestry` instead of looping.
//! - All checks run before the mutating store call, never after.
//! - Deletes are never cascaded. A category with children or files is
//!   rejected as a whole.
//! - Checks fail closed. Child and file counts include records that do not
//!   decode, and an undecodable category aborts any ancestry walk with
//!   `Repo(InvalidData)`.

use crate::model::category::{Category, CategoryId, CategoryPatch, NewCategory};
use crate::model::validation::ValidationError;
use crate::query::Predicate;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::file_repo::FileRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Separator used by `path_label`.
pub const PATH_SEPARATOR: &str = " > ";

/// Integrity failures from hierarchy checks and guarded mutations.
#[derive(Debug)]
pub enum HierarchyError {
    /// Category does not exist.
    NotFound(CategoryId),
    /// Proposed parent category does not exist.
    ParentNotFound(CategoryId),
    /// A category cannot be its own parent.
    SelfParent(CategoryId),
    /// Proposed parent is a descendant of the category.
    CycleDetected {
        category_id: CategoryId,
        parent_id: CategoryId,
    },
    /// Delete rejected: the category still has child categories.
    HasChildren {
        category_id: CategoryId,
        child_count: usize,
    },
    /// Delete rejected: files are still attached to the category.
    HasFiles {
        category_id: CategoryId,
        file_count: usize,
    },
    /// Stored parent links contain a cycle reachable from this category.
    CorruptAncestry {
        category_id: CategoryId,
        step_bound: usize,
    },
    /// Field validation failed.
    Validation(ValidationError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for HierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "category not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent category not found: {id}"),
            Self::SelfParent(id) => write!(f, "category cannot be its own parent: {id}"),
            Self::CycleDetected {
                category_id,
                parent_id,
            } => write!(
                f,
                "cannot move category {category_id} under its descendant {parent_id}"
            ),
            Self::HasChildren {
                category_id,
                child_count,
            } => write!(
                f,
                "cannot delete category {category_id} with {child_count} child categories"
            ),
            Self::HasFiles {
                category_id,
                file_count,
            } => write!(
                f,
                "cannot delete category {category_id} with {file_count} attached files"
            ),
            Self::CorruptAncestry {
                category_id,
                step_bound,
            } => write!(
                f,
                "category ancestry of {category_id} exceeds {step_bound} steps; parent links contain a cycle"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HierarchyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HierarchyError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Hierarchy integrity facade over category and file repositories.
pub struct HierarchyService<'store> {
    categories: CategoryRepository<'store>,
    files: FileRepository<'store>,
}

impl<'store> HierarchyService<'store> {
    pub fn new(categories: CategoryRepository<'store>, files: FileRepository<'store>) -> Self {
        Self { categories, files }
    }

    /// Category names from root to `category_id` inclusive.
    ///
    /// A dangling parent link (parent record missing) ends the walk early
    /// with a `warn` event; the partial path is returned.
    pub fn compute_path(&self, category_id: CategoryId) -> Result<Vec<String>, HierarchyError> {
        let snapshot = self.snapshot()?;
        let chain = walk_to_root(&snapshot, category_id)?;
        Ok(chain
            .into_iter()
            .rev()
            .map(|category| category.name.clone())
            .collect())
    }

    /// `compute_path` joined with `" > "`.
    pub fn path_label(&self, category_id: CategoryId) -> Result<String, HierarchyError> {
        Ok(self.compute_path(category_id)?.join(PATH_SEPARATOR))
    }

    /// Ids of every category whose ancestor chain passes through
    /// `category_id`. The category itself is not included.
    pub fn descendants(
        &self,
        category_id: CategoryId,
    ) -> Result<HashSet<CategoryId>, HierarchyError> {
        let snapshot = self.snapshot()?;
        if !snapshot.contains_key(&category_id) {
            return Err(HierarchyError::NotFound(category_id));
        }
        descendants_in(&snapshot, category_id)
    }

    /// Whether `category_id` may move under `proposed_parent_id`.
    ///
    /// Moving to root level (`None`) is always allowed. A self-parent or a
    /// descendant parent is rejected with `Ok(false)`.
    ///
    /// # Errors
    /// - `NotFound` when `category_id` does not exist.
    /// - `ParentNotFound` when the proposed parent does not exist.
    /// - `CorruptAncestry` when stored parent links already contain a cycle.
    pub fn can_reparent(
        &self,
        category_id: CategoryId,
        proposed_parent_id: Option<CategoryId>,
    ) -> Result<bool, HierarchyError> {
        let snapshot = self.snapshot()?;
        Ok(reparent_blocker(&snapshot, category_id, proposed_parent_id)?.is_none())
    }

    /// Whether `category_id` has no child categories and no attached files.
    pub fn can_delete(&self, category_id: CategoryId) -> Result<bool, HierarchyError> {
        self.require(category_id)?;
        Ok(self.delete_blocker(category_id)?.is_none())
    }

    /// Creates a category after checking that its parent exists.
    pub fn create_category(&self, new_category: &NewCategory) -> Result<Category, HierarchyError> {
        if let Some(parent_id) = new_category.parent_id {
            if self.categories.find_by_pk(parent_id)?.is_none() {
                return Err(HierarchyError::ParentNotFound(parent_id));
            }
        }
        let category = self.categories.create(new_category)?;
        info!(
            "event=category_create module=hierarchy status=ok id={} root={}",
            category.id,
            category.is_root()
        );
        Ok(category)
    }

    /// Updates one category. A parent change is gated by the same rules as
    /// `can_reparent` and reported as `SelfParent` or `CycleDetected`.
    pub fn update_category(
        &self,
        category_id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Category, HierarchyError> {
        if let Some(proposed_parent_id) = patch.parent_id {
            let snapshot = self.snapshot()?;
            if let Some(err) = reparent_blocker(&snapshot, category_id, proposed_parent_id)? {
                warn!(
                    "event=category_reparent module=hierarchy status=rejected id={} error={}",
                    category_id, err
                );
                return Err(err);
            }
        } else {
            self.require(category_id)?;
        }

        self.categories
            .update(patch, &Predicate::by_id(category_id))?
            .records
            .into_iter()
            .next()
            .ok_or(HierarchyError::NotFound(category_id))
    }

    /// Moves `category_id` under `parent_id` (`None` = root level).
    pub fn reparent_category(
        &self,
        category_id: CategoryId,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, HierarchyError> {
        self.update_category(category_id, &CategoryPatch::reparent(parent_id))
    }

    /// Deletes one category if it has no children and no attached files.
    pub fn delete_category(&self, category_id: CategoryId) -> Result<(), HierarchyError> {
        self.require(category_id)?;
        if let Some(err) = self.delete_blocker(category_id)? {
            warn!(
                "event=category_delete module=hierarchy status=rejected id={} error={}",
                category_id, err
            );
            return Err(err);
        }

        let removed = self.categories.destroy(&Predicate::by_id(category_id))?;
        if removed == 0 {
            return Err(HierarchyError::NotFound(category_id));
        }
        info!(
            "event=category_delete module=hierarchy status=ok id={}",
            category_id
        );
        Ok(())
    }

    /// Walks the ancestry of every category and returns how many were
    /// verified. Fails on the first corrupt chain.
    pub fn verify_forest(&self) -> Result<usize, HierarchyError> {
        let snapshot = self.snapshot()?;
        for category_id in snapshot.keys() {
            walk_to_root(&snapshot, *category_id)?;
        }
        Ok(snapshot.len())
    }

    fn require(&self, category_id: CategoryId) -> Result<Category, HierarchyError> {
        self.categories
            .find_by_pk(category_id)?
            .ok_or(HierarchyError::NotFound(category_id))
    }

    fn delete_blocker(
        &self,
        category_id: CategoryId,
    ) -> Result<Option<HierarchyError>, HierarchyError> {
        let child_count = self
            .categories
            .count_where(&CategoryRepository::children_of(Some(category_id)));
        if child_count > 0 {
            return Ok(Some(HierarchyError::HasChildren {
                category_id,
                child_count,
            }));
        }

        let file_count = self
            .files
            .count_where(&FileRepository::in_category(category_id));
        if file_count > 0 {
            return Ok(Some(HierarchyError::HasFiles {
                category_id,
                file_count,
            }));
        }

        Ok(None)
    }

    /// One consistent read of every category, keyed by id. An undecodable
    /// category fails the read so no walk runs over a partial forest.
    fn snapshot(&self) -> Result<HashMap<CategoryId, Category>, HierarchyError> {
        Ok(self
            .categories
            .find_all_strict(&Predicate::new())?
            .into_iter()
            .map(|category| (category.id, category))
            .collect())
    }
}

/// Chain from `start` up to its root, leaf first.
fn walk_to_root(
    snapshot: &HashMap<CategoryId, Category>,
    start: CategoryId,
) -> Result<Vec<&Category>, HierarchyError> {
    let step_bound = snapshot.len();
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor = Some(start);

    while let Some(current) = cursor {
        let Some(category) = snapshot.get(&current) else {
            if current == start {
                return Err(HierarchyError::NotFound(start));
            }
            warn!(
                "event=category_path module=hierarchy status=degraded id={} missing_parent={}",
                start, current
            );
            break;
        };
        if chain.len() >= step_bound || !visited.insert(current) {
            return Err(HierarchyError::CorruptAncestry {
                category_id: start,
                step_bound,
            });
        }
        chain.push(category);
        cursor = category.parent_id;
    }

    Ok(chain)
}

fn descendants_in(
    snapshot: &HashMap<CategoryId, Category>,
    ancestor_id: CategoryId,
) -> Result<HashSet<CategoryId>, HierarchyError> {
    let mut descendants = HashSet::new();
    for category_id in snapshot.keys() {
        if *category_id == ancestor_id {
            continue;
        }
        let chain = walk_to_root(snapshot, *category_id)?;
        if chain.iter().skip(1).any(|ancestor| ancestor.id == ancestor_id) {
            descendants.insert(*category_id);
        }
    }
    Ok(descendants)
}

/// Reason `category_id` may not move under `proposed_parent_id`, if any.
fn reparent_blocker(
    snapshot: &HashMap<CategoryId, Category>,
    category_id: CategoryId,
    proposed_parent_id: Option<CategoryId>,
) -> Result<Option<HierarchyError>, HierarchyError> {
    if !snapshot.contains_key(&category_id) {
        return Err(HierarchyError::NotFound(category_id));
    }
    let Some(parent_id) = proposed_parent_id else {
        return Ok(None);
    };
    if parent_id == category_id {
        return Ok(Some(HierarchyError::SelfParent(category_id)));
    }
    if !snapshot.contains_key(&parent_id) {
        return Err(HierarchyError::ParentNotFound(parent_id));
    }
    if descendants_in(snapshot, category_id)?.contains(&parent_id) {
        return Ok(Some(HierarchyError::CycleDetected {
            category_id,
            parent_id,
        }));
    }
    Ok(None)
}

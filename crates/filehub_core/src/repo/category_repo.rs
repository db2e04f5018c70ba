//! Category repository.
//!
//! Plain CRUD over the `categories` partition. It validates field shapes
//! but performs no parent-link checks; mutating callers must consult
//! `HierarchyService` first.

use super::collection::Collection;
use super::RepoResult;
use crate::model::category::{Category, CategoryId, CategoryPatch, NewCategory};
use crate::query::Predicate;
use crate::store::{RecordStore, UpdateResult};
use serde_json::Value;

/// Typed facade over the `categories` partition.
#[derive(Clone, Copy)]
pub struct CategoryRepository<'store> {
    categories: Collection<'store, Category>,
}

impl<'store> CategoryRepository<'store> {
    pub fn new(store: &'store RecordStore) -> Self {
        Self {
            categories: Collection::new(store),
        }
    }

    pub fn create(&self, new_category: &NewCategory) -> RepoResult<Category> {
        self.categories.insert(new_category.to_record()?)
    }

    pub fn find_all(&self, predicate: &Predicate) -> RepoResult<Vec<Category>> {
        self.categories.find_all(predicate)
    }

    /// Like `find_all`, but an undecodable category is an error instead of
    /// being skipped.
    pub fn find_all_strict(&self, predicate: &Predicate) -> RepoResult<Vec<Category>> {
        self.categories.find_all_strict(predicate)
    }

    /// Raw match count; undecodable categories are counted too.
    pub fn count_where(&self, predicate: &Predicate) -> usize {
        self.categories.count_where(predicate)
    }

    pub fn find_one(&self, predicate: &Predicate) -> RepoResult<Option<Category>> {
        self.categories.find_one(predicate)
    }

    pub fn find_by_pk(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        self.categories.find_by_pk(id)
    }

    /// Direct children of `parent_id` (`None` = root level), sorted by name
    /// then id.
    pub fn find_children(&self, parent_id: Option<CategoryId>) -> RepoResult<Vec<Category>> {
        let mut children = self.categories.find_all(&Self::children_of(parent_id))?;
        children.sort_by(|left, right| {
            left.name
                .cmp(&right.name)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(children)
    }

    pub fn update(
        &self,
        patch: &CategoryPatch,
        predicate: &Predicate,
    ) -> RepoResult<UpdateResult<Category>> {
        self.categories.update(&patch.to_record()?, predicate)
    }

    pub fn destroy(&self, predicate: &Predicate) -> RepoResult<usize> {
        self.categories.destroy(predicate)
    }

    pub fn count(&self) -> usize {
        self.categories.count()
    }

    /// Predicate selecting the direct children of `parent_id`.
    pub fn children_of(parent_id: Option<CategoryId>) -> Predicate {
        Predicate::new().eq(
            Category::PARENT_ID,
            parent_id.map_or(Value::Null, |id| Value::String(id.to_string())),
        )
    }
}

//! Category tree node entity.
//!
//! # Invariants
//! - `parent_id = None` marks a root category.
//! - Parent links form a forest. This is NOT enforced here; callers must go
//!   through `HierarchyService` before mutating parent links.

use super::user::UserId;
use super::validation::{required_text, ValidationError};
use super::Entity;
use crate::store::{EntityKind, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type CategoryId = Uuid;

pub const CATEGORY_NAME_MAX: usize = 50;
pub const CATEGORY_DESCRIPTION_MAX: usize = 500;

/// Stored category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    /// Parent category. `None` means root level.
    pub parent_id: Option<CategoryId>,
    pub created_by_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Category {
    pub const NAME: &'static str = "name";
    pub const DESCRIPTION: &'static str = "description";
    pub const PARENT_ID: &'static str = "parentId";
    pub const CREATED_BY_ID: &'static str = "createdById";

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
    pub created_by_id: UserId,
}

impl NewCategory {
    pub fn root(
        name: impl Into<String>,
        description: impl Into<String>,
        created_by_id: UserId,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parent_id: None,
            created_by_id,
        }
    }

    pub fn child_of(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Validates fields and returns the record to store.
    pub(crate) fn to_record(&self) -> Result<Record, ValidationError> {
        let mut record = Record::new();
        record.insert(
            Category::NAME,
            required_text("name", &self.name, CATEGORY_NAME_MAX)?,
        );
        record.insert(
            Category::DESCRIPTION,
            required_text("description", &self.description, CATEGORY_DESCRIPTION_MAX)?,
        );
        record.insert(Category::PARENT_ID, id_value(self.parent_id));
        record.insert(Category::CREATED_BY_ID, self.created_by_id.to_string());
        Ok(record)
    }
}

/// Partial category update.
///
/// `parent_id: Some(None)` moves the category to root level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Option<CategoryId>>,
}

impl CategoryPatch {
    pub fn reparent(parent_id: Option<CategoryId>) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }

    /// Validates the set fields and returns the patch record.
    pub(crate) fn to_record(&self) -> Result<Record, ValidationError> {
        let mut record = Record::new();
        if let Some(name) = &self.name {
            record.insert(Category::NAME, required_text("name", name, CATEGORY_NAME_MAX)?);
        }
        if let Some(description) = &self.description {
            record.insert(
                Category::DESCRIPTION,
                required_text("description", description, CATEGORY_DESCRIPTION_MAX)?,
            );
        }
        if let Some(parent_id) = self.parent_id {
            record.insert(Category::PARENT_ID, id_value(parent_id));
        }
        Ok(record)
    }
}

fn id_value(id: Option<Uuid>) -> Value {
    id.map_or(Value::Null, |id| Value::String(id.to_string()))
}

//! Predicate map builder.

use crate::store::record::ID_FIELD;
use serde_json::Value;
use std::collections::BTreeMap;

/// Conjunctive equality filter: field name to expected JSON value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    fields: BTreeMap<String, Value>,
}

impl Predicate {
    /// Empty predicate; matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Predicate selecting one record by identifier.
    pub fn by_id(id: impl ToString) -> Self {
        Self::new().eq(ID_FIELD, id.to_string())
    }

    /// Adds one `field == value` clause, replacing any earlier clause on the
    /// same field.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Expected `id`, when the predicate pins one as a string.
    ///
    /// Store operations use this to dispatch to single-record mode.
    pub fn id_value(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

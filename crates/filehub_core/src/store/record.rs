//! Schema-less record shape shared by every partition.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

const MAX_ID_LEN: usize = 128;

/// One persisted document: field name to JSON value.
///
/// The store only relies on `id`, `createdAt` and `updatedAt`; every other
/// field is opaque at this layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes this record into a typed entity.
    pub fn to_entity<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(Value::Object(self.0.clone()))
    }

    /// Record identifier, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn created_at(&self) -> Option<i64> {
        self.0.get(CREATED_AT_FIELD).and_then(Value::as_i64)
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.0.get(UPDATED_AT_FIELD).and_then(Value::as_i64)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Shallow merge: every top-level field in `patch` overwrites the same
    /// field here. Identity fields in the patch are ignored.
    pub fn merge(&mut self, patch: &Record) {
        for (field, value) in patch.fields() {
            if field == ID_FIELD || field == CREATED_AT_FIELD {
                continue;
            }
            self.0.insert(field.clone(), value.clone());
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

/// Result of an update: how many records matched and their new state.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult<T> {
    pub matched_count: usize,
    pub records: Vec<T>,
}

impl<T> UpdateResult<T> {
    pub fn empty() -> Self {
        Self {
            matched_count: 0,
            records: Vec::new(),
        }
    }

    /// Converts every record, keeping `matched_count`.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<UpdateResult<U>, E> {
        let records = self.records.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(UpdateResult {
            matched_count: self.matched_count,
            records,
        })
    }
}

/// Current wall clock as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Whether `id` is usable as a record file stem.
pub(crate) fn is_valid_record_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

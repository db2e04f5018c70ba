//! Equality-predicate selection over loaded records.
//!
//! # Responsibility
//! - Decide whether a record satisfies a conjunctive equality predicate.
//! - Provide find-one/filter helpers used by the store's batch operations.
//!
//! # Invariants
//! - Matching is exact JSON value equality, field by field. No substring,
//!   range or case-insensitive matching.
//! - A field missing from the record never matches, not even `null`.
//! - An empty predicate matches every record.
//! - `find_one` returns the first match in iteration order. Store order is
//!   unspecified, so it never implies uniqueness.

pub mod predicate;

pub use predicate::Predicate;

use crate::store::Record;

/// Whether `record` satisfies every field of `predicate`.
pub fn matches(record: &Record, predicate: &Predicate) -> bool {
    predicate
        .fields()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

/// First record matching `predicate`, in iteration order.
pub fn find_one<'a>(records: &'a [Record], predicate: &Predicate) -> Option<&'a Record> {
    records.iter().find(|record| matches(record, predicate))
}

/// All records matching `predicate`, preserving iteration order.
pub fn filter(records: Vec<Record>, predicate: &Predicate) -> Vec<Record> {
    if predicate.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| matches(record, predicate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter, find_one, matches, Predicate};
    use crate::store::Record;
    use serde_json::{json, Value};

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(field, value)| (*field, value.clone()))
            .collect()
    }

    #[test]
    fn empty_predicate_matches_everything() {
        let records = vec![record(&[("id", json!("a"))]), record(&[])];
        assert_eq!(filter(records.clone(), &Predicate::new()).len(), 2);
        assert!(matches(&records[1], &Predicate::new()));
    }

    #[test]
    fn all_fields_must_be_equal() {
        let file = record(&[
            ("id", json!("f1")),
            ("categoryId", json!("c1")),
            ("isPublic", json!(true)),
        ]);

        assert!(matches(&file, &Predicate::new().eq("categoryId", "c1")));
        assert!(matches(
            &file,
            &Predicate::new().eq("categoryId", "c1").eq("isPublic", true)
        ));
        assert!(!matches(
            &file,
            &Predicate::new().eq("categoryId", "c1").eq("isPublic", false)
        ));
        assert!(!matches(&file, &Predicate::new().eq("categoryId", "c")));
    }

    #[test]
    fn missing_field_does_not_match_null() {
        let root = record(&[("id", json!("a")), ("parentId", Value::Null)]);
        let legacy = record(&[("id", json!("b"))]);
        let roots = Predicate::new().eq("parentId", Value::Null);

        assert!(matches(&root, &roots));
        assert!(!matches(&legacy, &roots));
    }

    #[test]
    fn numbers_compare_by_value_not_by_text() {
        let file = record(&[("downloadCount", json!(3))]);
        assert!(matches(&file, &Predicate::new().eq("downloadCount", 3)));
        assert!(!matches(&file, &Predicate::new().eq("downloadCount", "3")));
    }

    #[test]
    fn find_one_returns_first_in_iteration_order() {
        let records = vec![
            record(&[("id", json!("1")), ("role", json!("admin"))]),
            record(&[("id", json!("2")), ("role", json!("admin"))]),
        ];
        let found = find_one(&records, &Predicate::new().eq("role", "admin")).unwrap();
        assert_eq!(found.id(), Some("1"));
        assert!(find_one(&records, &Predicate::new().eq("role", "user")).is_none());
    }
}

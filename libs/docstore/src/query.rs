//! Ordered collection queries.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::StoredDocument;

/// Sort direction of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// A whole-collection query ordered by one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    pub order_by: Option<String>,
    pub direction: Direction,
}

impl Query {
    /// All documents of a collection in insertion order.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            order_by: None,
            direction: Direction::Ascending,
        }
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(field.into());
        self.direction = direction;
        self
    }

    /// Sort documents paired with their insertion sequence.
    ///
    /// Documents missing the order field go last. Ties fall back to
    /// insertion order, following the query direction.
    pub(crate) fn sort(&self, mut docs: Vec<(u64, StoredDocument)>) -> Vec<StoredDocument> {
        let field = self.order_by.as_deref();
        let direction = self.direction;

        docs.sort_by(|(seq_a, a), (seq_b, b)| {
            let va = field.and_then(|f| a.data.get(f));
            let vb = field.and_then(|f| b.data.get(f));

            let ordering = match (va, vb) {
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (Some(x), Some(y)) => compare_values(x, y),
                (None, None) => Ordering::Equal,
            }
            .then(seq_a.cmp(seq_b));

            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });

        docs.into_iter().map(|(_, doc)| doc).collect()
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// Total order over JSON values.
///
/// Values of different types order by type. Strings that are both RFC 3339
/// timestamps compare chronologically.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(p, q)| compare_values(p, q))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(id: &str, data: Value) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            data: data.as_object().cloned().unwrap(),
        }
    }

    fn ids(docs: &[StoredDocument]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_timestamps_compare_chronologically() {
        // Lexicographic order would put the fractional timestamp after the later one.
        let a = json!("2025-06-01T10:00:00.5Z");
        let b = json!("2025-06-01T10:00:01Z");
        assert_eq!(compare_values(&a, &b), Ordering::Less);

        let c = json!("2025-06-01T12:00:00+02:00");
        let d = json!("2025-06-01T11:00:00Z");
        assert_eq!(compare_values(&c, &d), Ordering::Less);
    }

    #[test]
    fn test_descending_with_missing_field_last() {
        let query = Query::collection("historial").order_by("fecha", Direction::Descending);
        let docs = vec![
            (1, stored("old", json!({ "fecha": "2025-06-01T08:00:00Z" }))),
            (2, stored("none", json!({}))),
            (3, stored("new", json!({ "fecha": "2025-06-02T08:00:00Z" }))),
        ];
        assert_eq!(ids(&query.sort(docs)), vec!["new", "old", "none"]);
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let docs = || {
            vec![
                (1, stored("first", json!({ "n": 1 }))),
                (2, stored("second", json!({ "n": 1 }))),
            ]
        };
        let asc = Query::collection("c").order_by("n", Direction::Ascending);
        assert_eq!(ids(&asc.sort(docs())), vec!["first", "second"]);
        let desc = Query::collection("c").order_by("n", Direction::Descending);
        assert_eq!(ids(&desc.sort(docs())), vec!["second", "first"]);
    }

    #[test]
    fn test_unordered_query_uses_insertion_order() {
        let query = Query::collection("c");
        let docs = vec![
            (2, stored("b", json!({}))),
            (1, stored("a", json!({}))),
        ];
        assert_eq!(ids(&query.sort(docs)), vec!["a", "b"]);
    }

    #[test]
    fn test_mixed_types() {
        assert_eq!(compare_values(&json!(10), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
    }
}

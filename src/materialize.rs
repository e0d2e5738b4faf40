//! Conversion of wire-format rows into typed records.
//!
//! The engine returns self-describing JSON documents; materialization maps
//! them to [`ResultRow`]s lazily, one row per `next` call. The sequence is
//! finite and single-pass: re-execute the statement to iterate again.

use serde_json::Value;

use crate::value::{Datum, ResultRow};

/// Lazy sequence of materialized rows.
#[derive(Debug)]
pub struct ResultSet {
    rows: std::vec::IntoIter<Value>,
    projection: Vec<String>,
}

impl ResultSet {
    /// Wrap raw result records. `projection` lists the fields the caller
    /// asked for, so absent keys can be distinguished as missing.
    pub fn new(rows: Vec<Value>, projection: Vec<String>) -> Self {
        Self {
            rows: rows.into_iter(),
            projection,
        }
    }
}

impl Iterator for ResultSet {
    type Item = ResultRow;

    fn next(&mut self) -> Option<ResultRow> {
        self.rows
            .next()
            .map(|row| materialize_row(row, &self.projection))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for ResultSet {}

/// Materialize one wire row.
///
/// JSON `null` becomes [`Datum::Null`]; a projected field whose key is
/// absent becomes [`Datum::Missing`]. Rows that are not objects (e.g.
/// `SELECT VALUE` scalars) materialize as a single `value` column —
/// unexpected-but-decodable shapes never fail.
fn materialize_row(row: Value, projection: &[String]) -> ResultRow {
    match row {
        Value::Object(map) => {
            let mut columns: Vec<(String, Datum)> = map
                .into_iter()
                .map(|(key, value)| (key, Datum::from(value)))
                .collect();
            for name in projection {
                let leaf = name.rsplit('.').next().unwrap_or(name);
                if !columns.iter().any(|(key, _)| key == leaf) {
                    columns.push((leaf.to_string(), Datum::Missing));
                }
            }
            ResultRow::new(columns)
        }
        other => ResultRow::new(vec![("value".to_string(), Datum::from(other))]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_missing_are_distinguished() {
        let projection = vec!["name".to_string(), "email".to_string()];
        let rows = vec![json!({"name": "Bob", "email": null}), json!({"name": "Ann"})];
        let mut set = ResultSet::new(rows, projection);

        let bob = set.next().unwrap();
        assert_eq!(bob.get("name"), Some(&Datum::from("Bob")));
        assert_eq!(bob.get("email"), Some(&Datum::Null));

        let ann = set.next().unwrap();
        assert_eq!(ann.get("email"), Some(&Datum::Missing));
        assert!(set.next().is_none());
    }

    #[test]
    fn nested_structures_map_recursively() {
        let rows = vec![json!({
            "name": "Cafe",
            "tags": ["coffee", "wifi"],
            "addr": {"city": "Irvine", "zip": null},
        })];
        let row = ResultSet::new(rows, vec![]).next().unwrap();
        assert_eq!(
            row.get("tags"),
            Some(&Datum::Array(vec![
                Datum::from("coffee"),
                Datum::from("wifi")
            ]))
        );
        let addr = row.get("addr").unwrap();
        assert_eq!(addr.get("city"), Some(&Datum::from("Irvine")));
        assert_eq!(addr.get("zip"), Some(&Datum::Null));
        assert_eq!(addr.get("street"), None);
    }

    #[test]
    fn select_value_rows_become_value_column() {
        let rows = vec![json!(42), json!("plain")];
        let mut set = ResultSet::new(rows, vec![]);
        assert_eq!(set.next().unwrap().get("value"), Some(&Datum::Int(42)));
        assert_eq!(
            set.next().unwrap().get("value"),
            Some(&Datum::from("plain"))
        );
    }

    #[test]
    fn heterogeneous_rows_do_not_fail() {
        let rows = vec![
            json!({"x": 1}),
            json!({"x": "one", "extra": true}),
            json!([1, 2]),
        ];
        let set = ResultSet::new(rows, vec!["x".to_string()]);
        assert_eq!(set.count(), 3);
    }

    #[test]
    fn dotted_projection_checks_leaf_key() {
        let rows = vec![json!({"name": "Bob"})];
        let row = ResultSet::new(rows, vec!["Users.email".to_string()])
            .next()
            .unwrap();
        assert_eq!(row.get("email"), Some(&Datum::Missing));
    }
}

//! Host-side representation of AsterixDB values.
//!
//! AsterixDB's open document model lets a field be absent, explicitly null,
//! or carry a different type from row to row, so rows cross the wire as
//! self-describing documents. `Datum` is the tagged variant that preserves
//! that model in memory, including the null-vs-missing distinction.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// A single AsterixDB value at the host boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// Explicit JSON `null`.
    Null,
    /// The field's key is absent from the record. Distinct from `Null`.
    Missing,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Array(Vec<Datum>),
    /// Record fields in wire order.
    Object(Vec<(String, Datum)>),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Datum::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Double(f) => Some(*f),
            Datum::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Field lookup on an object datum.
    pub fn get(&self, field: &str) -> Option<&Datum> {
        match self {
            Datum::Object(fields) => fields.iter().find(|(k, _)| k == field).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Convert to a JSON value for server-side parameter binding.
    ///
    /// `Missing` has no JSON spelling and is rejected; temporal variants
    /// travel as their ISO-8601 text.
    pub fn to_json(&self) -> ClientResult<Value> {
        match self {
            Datum::Null => Ok(Value::Null),
            Datum::Missing => Err(ClientError::Encoding(
                "missing cannot be bound as a parameter value".to_string(),
            )),
            Datum::Bool(b) => Ok(Value::Bool(*b)),
            Datum::Int(i) => Ok(Value::from(*i)),
            Datum::Double(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| ClientError::Encoding(format!("non-finite number: {f}"))),
            Datum::Str(s) => Ok(Value::String(s.clone())),
            Datum::DateTime(dt) => Ok(Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())),
            Datum::Date(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
            Datum::Time(t) => Ok(Value::String(t.format("%H:%M:%S%.3f").to_string())),
            Datum::Array(items) => {
                let converted = items.iter().map(Datum::to_json).collect::<ClientResult<_>>()?;
                Ok(Value::Array(converted))
            }
            Datum::Object(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_json()?);
                }
                Ok(Value::Object(map))
            }
        }
    }
}

impl From<Value> for Datum {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Datum::Null,
            Value::Bool(b) => Datum::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Datum::Int(i)
                } else {
                    Datum::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Datum::Str(s),
            Value::Array(items) => Datum::Array(items.into_iter().map(Datum::from).collect()),
            Value::Object(map) => {
                Datum::Object(map.into_iter().map(|(k, v)| (k, Datum::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Bool(b)
    }
}

impl From<i32> for Datum {
    fn from(i: i32) -> Self {
        Datum::Int(i64::from(i))
    }
}

impl From<i64> for Datum {
    fn from(i: i64) -> Self {
        Datum::Int(i)
    }
}

impl From<f64> for Datum {
    fn from(f: f64) -> Self {
        Datum::Double(f)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Str(s.to_string())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::Str(s)
    }
}

impl From<NaiveDateTime> for Datum {
    fn from(dt: NaiveDateTime) -> Self {
        Datum::DateTime(dt)
    }
}

impl From<NaiveDate> for Datum {
    fn from(d: NaiveDate) -> Self {
        Datum::Date(d)
    }
}

impl From<NaiveTime> for Datum {
    fn from(t: NaiveTime) -> Self {
        Datum::Time(t)
    }
}

impl<T: Into<Datum>> From<Vec<T>> for Datum {
    fn from(items: Vec<T>) -> Self {
        Datum::Array(items.into_iter().map(Into::into).collect())
    }
}

/// One materialized result record, fields in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    columns: Vec<(String, Datum)>,
}

impl ResultRow {
    pub(crate) fn new(columns: Vec<(String, Datum)>) -> Self {
        Self { columns }
    }

    /// Value of the named field, if the row carries it.
    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.columns.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<(String, Datum)> {
        self.columns
    }
}

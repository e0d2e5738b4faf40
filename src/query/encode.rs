//! SQL++ literal encoding.
//!
//! The sole path by which user data reaches statement text. Callers never
//! splice raw strings into a statement; every operand goes through
//! [`encode`], which quotes and escapes so a literal can never terminate
//! early and smuggle in additional clauses.

use crate::error::{ClientError, ClientResult};
use crate::value::Datum;

/// Encode a host value as SQL++ literal text.
///
/// Deterministic and side-effect-free. `Missing` has no literal spelling
/// (it only appears in `IS MISSING`/`IS UNKNOWN` predicates, which render
/// no operand) and is rejected here.
pub fn encode(value: &Datum) -> ClientResult<String> {
    match value {
        Datum::Null => Ok("NULL".to_string()),
        Datum::Missing => Err(ClientError::Encoding(
            "missing is not a value literal; use an IS MISSING predicate".to_string(),
        )),
        Datum::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Datum::Int(i) => Ok(i.to_string()),
        Datum::Double(f) => {
            if !f.is_finite() {
                return Err(ClientError::Encoding(format!("non-finite number: {f}")));
            }
            Ok(f.to_string())
        }
        Datum::Str(s) => Ok(encode_str(s)),
        Datum::DateTime(dt) => Ok(format!(
            "datetime('{}')",
            dt.format("%Y-%m-%dT%H:%M:%S%.3f")
        )),
        Datum::Date(d) => Ok(format!("date('{}')", d.format("%Y-%m-%d"))),
        Datum::Time(t) => Ok(format!("time('{}')", t.format("%H:%M:%S%.3f"))),
        Datum::Array(items) => {
            let parts: Vec<String> = items.iter().map(encode).collect::<ClientResult<_>>()?;
            Ok(format!("[{}]", parts.join(", ")))
        }
        Datum::Object(fields) => {
            let mut parts = Vec::with_capacity(fields.len());
            for (key, val) in fields {
                let quoted_key = serde_json::Value::String(key.clone()).to_string();
                parts.push(format!("{}: {}", quoted_key, encode(val)?));
            }
            Ok(format!("{{{}}}", parts.join(", ")))
        }
    }
}

/// Single-quoted string literal with embedded quotes doubled and control
/// characters escaped.
fn encode_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Substitute `?` placeholders with encoded literals, left to right.
///
/// Placeholder and value counts must match exactly.
pub fn bind_positional(statement: &str, values: &[Datum]) -> ClientResult<String> {
    let placeholders = statement.matches('?').count();
    if placeholders != values.len() {
        return Err(ClientError::QueryBuild(format!(
            "statement has {} placeholders but {} parameters were given",
            placeholders,
            values.len()
        )));
    }

    let mut parts = statement.split('?');
    let mut out = String::with_capacity(statement.len());
    if let Some(head) = parts.next() {
        out.push_str(head);
    }
    for (value, tail) in values.iter().zip(parts) {
        out.push_str(&encode(value)?);
        out.push_str(tail);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(encode(&Datum::from("plain")).unwrap(), "'plain'");
        assert_eq!(encode(&Datum::from("O'Brien")).unwrap(), "'O''Brien'");
    }

    #[test]
    fn injection_attempt_stays_one_literal() {
        let encoded = encode(&Datum::from("a'; DROP DATASET Users; --")).unwrap();
        assert_eq!(encoded, "'a''; DROP DATASET Users; --'");
        // The interior quote is doubled, so the literal cannot terminate early.
        assert!(encoded.starts_with('\'') && encoded.ends_with('\''));
        assert!(!encoded[1..encoded.len() - 1].replace("''", "").contains('\''));
    }

    #[test]
    fn scalars_encode_canonically() {
        assert_eq!(encode(&Datum::Int(42)).unwrap(), "42");
        assert_eq!(encode(&Datum::Double(1.5)).unwrap(), "1.5");
        assert_eq!(encode(&Datum::Bool(true)).unwrap(), "true");
        assert_eq!(encode(&Datum::Null).unwrap(), "NULL");
    }

    #[test]
    fn missing_is_not_a_literal() {
        let err = encode(&Datum::Missing).unwrap_err();
        assert!(matches!(err, ClientError::Encoding(_)));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        assert!(encode(&Datum::Double(f64::NAN)).is_err());
        assert!(encode(&Datum::Double(f64::INFINITY)).is_err());
    }

    #[test]
    fn collections_encode_recursively() {
        let value = Datum::Object(vec![
            ("name".to_string(), Datum::from("Ann")),
            ("tags".to_string(), Datum::from(vec!["a", "b"])),
            ("score".to_string(), Datum::Null),
        ]);
        assert_eq!(
            encode(&value).unwrap(),
            r#"{"name": 'Ann', "tags": ['a', 'b'], "score": NULL}"#
        );
    }

    #[test]
    fn temporal_constructors() {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(encode(&Datum::Date(d)).unwrap(), "date('2024-03-09')");
        let t = d.and_hms_milli_opt(12, 30, 5, 250).unwrap();
        assert_eq!(
            encode(&Datum::DateTime(t)).unwrap(),
            "datetime('2024-03-09T12:30:05.250')"
        );
    }

    #[test]
    fn positional_binding_counts_placeholders() {
        let bound = bind_positional(
            "SELECT * FROM Users WHERE age > ? AND name = ?",
            &[Datum::Int(30), Datum::from("Bob")],
        )
        .unwrap();
        assert_eq!(bound, "SELECT * FROM Users WHERE age > 30 AND name = 'Bob'");

        let err = bind_positional("SELECT ? FROM x", &[]).unwrap_err();
        assert!(matches!(err, ClientError::QueryBuild(_)));
    }
}

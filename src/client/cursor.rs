//! Cursor-style interface over raw SQL++ statements.

use crate::client::Connection;
use crate::error::ClientResult;
use crate::materialize::ResultSet;
use crate::protocol::QueryRequest;
use crate::query::encode::bind_positional;
use crate::value::{Datum, ResultRow};

/// Parameter bindings for a cursor execution.
///
/// Positional `?` placeholders are substituted client-side through the
/// literal encoder; named parameters travel as `$name` request fields and
/// are bound by the engine.
#[derive(Debug, Clone, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Datum>),
    Named(Vec<(String, Datum)>),
}

/// Executes statements and hands out rows one fetch at a time.
///
/// The row sequence of an execution is single-pass: rows handed out by
/// `fetchone`/`fetchmany`/`fetchall` are gone; re-execute to start over.
pub struct Cursor<'a> {
    conn: &'a Connection,
    rows: Option<ResultSet>,
    row_count: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            rows: None,
            row_count: 0,
        }
    }

    /// Execute a statement, replacing any previous result set.
    pub async fn execute(&mut self, statement: &str, params: Params) -> ClientResult<()> {
        let (text, named_args) = match params {
            Params::None => (statement.to_string(), Vec::new()),
            Params::Positional(values) => (bind_positional(statement, &values)?, Vec::new()),
            Params::Named(pairs) => {
                let mut named = Vec::with_capacity(pairs.len());
                for (name, value) in pairs {
                    let name = name.trim_start_matches('$').to_string();
                    named.push((name, value.to_json()?));
                }
                (statement.to_string(), named)
            }
        };

        let mut request = QueryRequest::new(text).with_dataverse(self.conn.current_dataverse());
        request.named_args = named_args;
        let response = self.conn.run_statement(request).await?;
        self.row_count = response.results.len();
        self.rows = Some(ResultSet::new(response.results, Vec::new()));
        Ok(())
    }

    /// Next row, or `None` when the result set is exhausted.
    pub fn fetchone(&mut self) -> Option<ResultRow> {
        self.rows.as_mut()?.next()
    }

    /// Up to `size` further rows.
    pub fn fetchmany(&mut self, size: usize) -> Vec<ResultRow> {
        let mut rows = Vec::with_capacity(size);
        if let Some(set) = self.rows.as_mut() {
            for _ in 0..size {
                match set.next() {
                    Some(row) => rows.push(row),
                    None => break,
                }
            }
        }
        rows
    }

    /// All remaining rows.
    pub fn fetchall(&mut self) -> Vec<ResultRow> {
        match self.rows.as_mut() {
            Some(set) => set.by_ref().collect(),
            None => Vec::new(),
        }
    }

    /// Number of rows the last execution returned.
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

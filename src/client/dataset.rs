//! Chainable query handle over one dataset.

use std::str::FromStr;

use crate::client::Connection;
use crate::error::{ClientError, ClientResult};
use crate::materialize::ResultSet;
use crate::protocol::QueryRequest;
use crate::query::descriptor::{
    Aggregate, JoinClause, JoinKind, Order, SelectDescriptor, Statement,
};
use crate::query::predicate::Predicate;
use crate::query::render::{render, render_count};
use crate::value::ResultRow;

/// Builder for a SELECT over one dataset.
///
/// Every call consumes the handle and returns an extended one; the
/// descriptor underneath is never mutated once rendered, so handles can be
/// staged and the same completed query renders identically every time.
/// Invalid arguments (negative limits, unknown aggregate names) are
/// recorded and surfaced by the terminal call — the reqwest builder
/// convention — so chains stay uninterrupted.
pub struct DatasetQuery<'a> {
    conn: &'a Connection,
    descriptor: SelectDescriptor,
    build_error: Option<ClientError>,
}

impl<'a> DatasetQuery<'a> {
    pub(crate) fn new(conn: &'a Connection, dataset: impl Into<String>) -> Self {
        Self {
            conn,
            descriptor: SelectDescriptor::new(dataset),
            build_error: None,
        }
    }

    fn fail(mut self, error: ClientError) -> Self {
        // First build error wins.
        if self.build_error.is_none() {
            self.build_error = Some(error);
        }
        self
    }

    /// Ordered projection. An empty call list keeps the `*` default.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor
            .projection
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Restrict the result set; combined with any existing predicate via
    /// implicit AND.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.descriptor = self.descriptor.with_predicate(predicate);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.descriptor.order_by.push((field.into(), order));
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        if n < 0 {
            return self.fail(ClientError::QueryBuild(format!(
                "limit must be non-negative, got {n}"
            )));
        }
        self.descriptor.limit = Some(n as u64);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        if n < 0 {
            return self.fail(ClientError::QueryBuild(format!(
                "offset must be non-negative, got {n}"
            )));
        }
        self.descriptor.offset = Some(n as u64);
        self
    }

    pub fn join(mut self, dataset: impl Into<String>, on: Predicate, kind: JoinKind) -> Self {
        self.descriptor.joins.push(JoinClause {
            dataset: dataset.into(),
            on,
            kind,
        });
        self
    }

    /// Group by `keys`, projecting `aggregates` as `(field, function)`
    /// pairs. Function names come from {count, sum, avg, min, max};
    /// anything else fails the build.
    pub fn group_by<K, KS, A, F, N>(mut self, keys: K, aggregates: A) -> Self
    where
        K: IntoIterator<Item = KS>,
        KS: Into<String>,
        A: IntoIterator<Item = (F, N)>,
        F: Into<String>,
        N: AsRef<str>,
    {
        self.descriptor
            .group_by
            .extend(keys.into_iter().map(Into::into));
        for (field, name) in aggregates {
            match Aggregate::from_str(name.as_ref()) {
                Ok(function) => self.descriptor.aggregates.push((field.into(), function)),
                Err(error) => return self.fail(error),
            }
        }
        self
    }

    fn take_descriptor(self) -> ClientResult<(SelectDescriptor, &'a Connection)> {
        match self.build_error {
            Some(error) => Err(error),
            None => Ok((self.descriptor, self.conn)),
        }
    }

    /// Statement text this handle would execute.
    pub fn render(&self) -> ClientResult<String> {
        if let Some(error) = &self.build_error {
            return Err(error.clone());
        }
        render(&Statement::Select(self.descriptor.clone()))
    }

    /// Execute and materialize the rows.
    pub async fn fetch(self) -> ClientResult<ResultSet> {
        let (descriptor, conn) = self.take_descriptor()?;
        conn.execute_statement(&Statement::Select(descriptor)).await
    }

    /// Execute with `LIMIT 1` and return the single row, if any.
    pub async fn fetch_one(self) -> ClientResult<Option<ResultRow>> {
        let mut rows = self.limit(1).fetch().await?;
        Ok(rows.next())
    }

    /// `SELECT COUNT(*)` over this handle's FROM/JOIN/WHERE shape.
    pub async fn count(self) -> ClientResult<u64> {
        let (descriptor, conn) = self.take_descriptor()?;
        let text = render_count(&descriptor)?;
        let request = QueryRequest::new(text)
            .with_dataverse(conn.current_dataverse())
            .readonly();
        let response = conn.run_statement(request).await?;
        let count = response
            .results
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|count| count.as_u64())
            .ok_or_else(|| {
                ClientError::Decode("count query returned no usable row".to_string())
            })?;
        Ok(count)
    }
}

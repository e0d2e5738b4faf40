//! Connection façade: pooled execution with bounded retry, the chainable
//! dataset query handle, and the cursor interface.

mod builder;
mod cursor;
mod dataset;

pub use builder::ConnectionBuilder;
pub use cursor::{Cursor, Params};
pub use dataset::DatasetQuery;

use parking_lot::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::executor;
use crate::materialize::ResultSet;
use crate::pool::{Pool, PoolStats, RetryPolicy};
use crate::protocol::{QueryRequest, QueryResponse};
use crate::query::descriptor::{DatasetDescriptor, Statement, TypeDescriptor};
use crate::query::predicate::{field, Predicate};
use crate::query::render::{render, validate_identifier};
use crate::value::Datum;

/// A connection to one AsterixDB cluster.
///
/// Holds the session pool and retry policy; safe to share between tasks.
/// All durable state lives in the remote engine — dropping a `Connection`
/// loses nothing but the pooled transport sessions.
#[derive(Debug)]
pub struct Connection {
    pub(crate) endpoint: Url,
    pub(crate) dataverse: RwLock<Option<String>>,
    pub(crate) pool: Pool,
    pub(crate) retry: RetryPolicy,
}

impl Connection {
    pub fn builder(endpoint: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder::new(endpoint)
    }

    /// Chainable query handle over one dataset.
    pub fn dataset(&self, name: impl Into<String>) -> DatasetQuery<'_> {
        DatasetQuery::new(self, name)
    }

    /// Cursor-style interface for raw statements.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    pub fn current_dataverse(&self) -> Option<String> {
        self.dataverse.read().clone()
    }

    /// Switch the dataverse context carried on subsequent requests.
    pub fn use_dataverse(&self, name: impl Into<String>) -> ClientResult<()> {
        let name = name.into();
        validate_identifier(&name)?;
        *self.dataverse.write() = Some(name);
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Shut the pool down; in-flight sessions are discarded on release.
    pub fn close(&self) {
        self.pool.close();
    }

    /// Render and execute a completed statement, returning materialized rows.
    pub async fn execute_statement(&self, statement: &Statement) -> ClientResult<ResultSet> {
        let text = render(statement)?;
        let projection = match statement {
            Statement::Select(descriptor) => descriptor.projection.clone(),
            _ => Vec::new(),
        };
        let mut request = QueryRequest::new(text).with_dataverse(self.current_dataverse());
        if matches!(statement, Statement::Select(_)) {
            request = request.readonly();
        }
        let response = self.run_statement(request).await?;
        Ok(ResultSet::new(response.results, projection))
    }

    /// Submit a request through the pool with bounded retry.
    ///
    /// Transient failures (transport errors, timeouts) are retried with
    /// exponential backoff and jitter; the session that failed is marked
    /// dead first. Engine rejections surface immediately.
    pub(crate) async fn run_statement(
        &self,
        request: QueryRequest,
    ) -> ClientResult<QueryResponse> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = None;
        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.retry.delay_for(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying statement");
                tokio::time::sleep(delay).await;
            }
            let mut session = self.pool.acquire().await?;
            match executor::execute(&self.endpoint, &session, &request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() => {
                    warn!(
                        session_id = session.id(),
                        attempt,
                        error = %err,
                        "transient failure"
                    );
                    session.mark_dead();
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_error
            .unwrap_or_else(|| ClientError::Transport("retry budget exhausted".to_string())))
    }

    /// Insert records into a dataset. Fails on primary-key conflicts.
    pub async fn insert(
        &self,
        dataset: impl Into<String>,
        records: Vec<Datum>,
    ) -> ClientResult<()> {
        self.execute_statement(&Statement::Insert {
            dataset: dataset.into(),
            records,
        })
        .await
        .map(drop)
    }

    /// Insert-or-replace records by primary key. The stored record is
    /// replaced wholesale; see [`Connection::upsert_merge`] for
    /// field-preserving updates.
    pub async fn upsert(
        &self,
        dataset: impl Into<String>,
        records: Vec<Datum>,
    ) -> ClientResult<()> {
        self.execute_statement(&Statement::Upsert {
            dataset: dataset.into(),
            records,
        })
        .await
        .map(drop)
    }

    /// Read-modify-write: overlay `updates` on the record whose
    /// `key_field` equals `key`, preserving every other stored field.
    ///
    /// Fields absent from both the stored record and the update map stay
    /// absent (missing), never defaulted. An update value of
    /// [`Datum::Missing`] removes that field. Returns `false` when no
    /// record matched.
    pub async fn upsert_merge(
        &self,
        dataset: impl Into<String>,
        key_field: &str,
        key: Datum,
        updates: Vec<(String, Datum)>,
    ) -> ClientResult<bool> {
        let dataset = dataset.into();
        let existing = self
            .dataset(&dataset)
            .filter(field(key_field).eq(key))
            .fetch_one()
            .await?;
        let Some(row) = existing else {
            return Ok(false);
        };

        let mut fields = row.into_columns();
        for (name, value) in updates {
            fields.retain(|(existing_name, _)| existing_name != &name);
            if !value.is_missing() {
                fields.push((name, value));
            }
        }
        self.upsert(dataset, vec![Datum::Object(fields)]).await?;
        Ok(true)
    }

    /// Delete every record matching the predicate.
    pub async fn delete(
        &self,
        dataset: impl Into<String>,
        predicate: Predicate,
    ) -> ClientResult<()> {
        self.execute_statement(&Statement::Delete {
            dataset: dataset.into(),
            predicate,
        })
        .await
        .map(drop)
    }

    pub async fn create_type(
        &self,
        descriptor: TypeDescriptor,
        if_not_exists: bool,
    ) -> ClientResult<()> {
        self.execute_statement(&Statement::CreateType {
            descriptor,
            if_not_exists,
        })
        .await
        .map(drop)
    }

    pub async fn create_dataset(&self, descriptor: DatasetDescriptor) -> ClientResult<()> {
        self.execute_statement(&Statement::CreateDataset(descriptor))
            .await
            .map(drop)
    }

    /// Create a dataverse and make it the current context.
    pub async fn create_dataverse(
        &self,
        name: impl Into<String>,
        if_not_exists: bool,
    ) -> ClientResult<()> {
        let name = name.into();
        self.execute_statement(&Statement::CreateDataverse {
            name: name.clone(),
            if_not_exists,
        })
        .await?;
        *self.dataverse.write() = Some(name);
        Ok(())
    }

    /// Drop a dataverse, clearing the current context if it matches.
    pub async fn drop_dataverse(
        &self,
        name: impl Into<String>,
        if_exists: bool,
    ) -> ClientResult<()> {
        let name = name.into();
        self.execute_statement(&Statement::DropDataverse {
            name: name.clone(),
            if_exists,
        })
        .await?;
        let mut current = self.dataverse.write();
        if current.as_deref() == Some(name.as_str()) {
            *current = None;
        }
        Ok(())
    }

    pub async fn drop_type(&self, name: impl Into<String>, if_exists: bool) -> ClientResult<()> {
        self.execute_statement(&Statement::DropType {
            name: name.into(),
            if_exists,
        })
        .await
        .map(drop)
    }

    pub async fn drop_dataset(
        &self,
        name: impl Into<String>,
        if_exists: bool,
    ) -> ClientResult<()> {
        self.execute_statement(&Statement::DropDataset {
            name: name.into(),
            if_exists,
        })
        .await
        .map(drop)
    }
}

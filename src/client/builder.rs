//! Connection configuration.

use std::time::Duration;

use parking_lot::RwLock;
use url::Url;

use crate::client::Connection;
use crate::error::{ClientError, ClientResult};
use crate::pool::{Pool, PoolConfig, RetryPolicy};
use crate::query::render::validate_identifier;

/// Builder for [`Connection`]. No network activity happens at build time;
/// sessions are created lazily by the pool.
///
/// ```no_run
/// use std::time::Duration;
/// use asterix_client::ConnectionBuilder;
///
/// let conn = ConnectionBuilder::new("http://localhost:19002")
///     .dataverse("TinySocial")
///     .max_pool_size(8)
///     .acquire_timeout(Duration::from_secs(5))
///     .request_timeout(Duration::from_secs(30))
///     .max_retries(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    endpoint: String,
    dataverse: Option<String>,
    pool: PoolConfig,
    retry: RetryPolicy,
}

impl ConnectionBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            dataverse: None,
            pool: PoolConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Dataverse context sent with every request.
    pub fn dataverse(mut self, name: impl Into<String>) -> Self {
        self.dataverse = Some(name.into());
        self
    }

    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.pool.max_size = size;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.pool.acquire_timeout = timeout;
        self
    }

    /// Per-attempt HTTP timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.pool.request_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pool.idle_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.pool.max_lifetime = lifetime;
        self
    }

    /// Total attempt budget for transient failures (1 = no retries).
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    /// Base and cap of the exponential backoff between retries.
    pub fn backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.retry.base_delay = base;
        self.retry.max_delay = cap;
        self
    }

    pub fn build(self) -> ClientResult<Connection> {
        let endpoint = Url::parse(self.endpoint.trim_end_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid endpoint '{}': {e}", self.endpoint)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "endpoint must be http(s), got '{}'",
                endpoint.scheme()
            )));
        }
        if let Some(dataverse) = &self.dataverse {
            validate_identifier(dataverse)?;
        }
        if self.pool.max_size == 0 {
            return Err(ClientError::Config(
                "pool size must be at least 1".to_string(),
            ));
        }
        Ok(Connection {
            endpoint,
            dataverse: RwLock::new(self.dataverse),
            pool: Pool::new(self.pool),
            retry: self.retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_endpoint() {
        assert!(ConnectionBuilder::new("not a url").build().is_err());
        assert!(ConnectionBuilder::new("ftp://host").build().is_err());
    }

    #[test]
    fn rejects_invalid_dataverse() {
        let err = ConnectionBuilder::new("http://localhost:19002")
            .dataverse("1bad")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Identifier(_)));
    }

    #[test]
    fn build_performs_no_network_io() {
        let conn = ConnectionBuilder::new("http://localhost:1") // nothing listens here
            .build()
            .unwrap();
        assert_eq!(conn.stats().in_use, 0);
    }
}

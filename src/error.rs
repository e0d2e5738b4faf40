use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the AsterixDB client.
///
/// Build-time failures (`Encoding`, `Identifier`, `QueryBuild`, `Config`)
/// are raised before any network activity. `Execution` carries the engine's
/// own diagnostic and is never retried; transient transport failures are
/// retried per the pool's backoff policy before surfacing.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid identifier: '{0}'")]
    Identifier(String),

    #[error("Query build error: {0}")]
    QueryBuild(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Pool acquire timed out after {0:?}")]
    PoolTimeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Execution error {code}: {message}")]
    Execution { code: i64, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection is closed")]
    Closed,
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Whether the retry policy may re-attempt after this failure.
    ///
    /// Engine rejections are deterministic for a given statement and are
    /// never retried; only transport-level failures and timeouts are.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Timeout(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

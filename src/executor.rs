//! Single-attempt statement submission.
//!
//! Performs exactly one HTTP exchange through a pooled session and
//! classifies the outcome; the bounded retry loop lives with the caller in
//! [`crate::client::Connection`].

use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::pool::PooledSession;
use crate::protocol::{QueryRequest, QueryResponse};

pub(crate) const QUERY_SERVICE_PATH: &str = "/query/service";

const BODY_PREVIEW_LIMIT: usize = 512;

/// Submit one rendered statement and classify the engine's answer.
pub(crate) async fn execute(
    endpoint: &Url,
    session: &PooledSession,
    request: &QueryRequest,
) -> ClientResult<QueryResponse> {
    let url = endpoint
        .join(QUERY_SERVICE_PATH)
        .map_err(|e| ClientError::Config(format!("invalid endpoint: {e}")))?;
    let fields = request.form_fields()?;

    debug!(
        session_id = session.id(),
        client_context_id = %request.client_context_id,
        "submitting statement"
    );

    let response = session.http().post(url).form(&fields).send().await?;
    let status = response.status();
    let body = response.text().await?;

    // The engine answers with a JSON envelope on both success and
    // rejection; a body that does not parse is either an infrastructure
    // failure (5xx, transient) or a malformed payload.
    let parsed: QueryResponse = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            if status.is_server_error() {
                return Err(ClientError::Transport(format!(
                    "HTTP {status}: {}",
                    preview(&body)
                )));
            }
            return Err(ClientError::Decode(format!(
                "malformed response payload: {e} (body: {})",
                preview(&body)
            )));
        }
    };
    parsed.into_result()
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .take_while(|(i, _)| *i < BODY_PREVIEW_LIMIT)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &body[..end]
}

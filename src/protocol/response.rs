//! Engine response envelope.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Engine-reported diagnostic attached to a failed request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineDiagnostic {
    pub code: i64,
    pub msg: String,
}

/// Envelope returned by `/query/service`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "requestID", default)]
    pub request_id: Option<String>,
    #[serde(rename = "clientContextID", default)]
    pub client_context_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<EngineDiagnostic>,
    #[serde(default)]
    pub metrics: Option<Value>,
}

impl QueryResponse {
    /// Separate engine rejection from a usable result set.
    ///
    /// Engine rejections are deterministic for the submitted statement and
    /// map to `Execution`; a server-side timeout maps to `Timeout` so the
    /// retry policy can re-attempt it.
    pub(crate) fn into_result(self) -> ClientResult<QueryResponse> {
        match self.status.as_str() {
            "success" => Ok(self),
            "timeout" => Err(ClientError::Timeout(
                "engine reported statement timeout".to_string(),
            )),
            status => {
                let (code, message) = match self.errors.first() {
                    Some(diag) => (diag.code, diag.msg.clone()),
                    None => (0, format!("engine returned status '{status}'")),
                };
                Err(ClientError::Execution { code, message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> QueryResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn success_keeps_results() {
        let response = parse(json!({
            "requestID": "r1",
            "status": "success",
            "results": [{"name": "Bob"}],
        }));
        let response = response.into_result().unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[test]
    fn fatal_status_surfaces_engine_diagnostic() {
        let response = parse(json!({
            "status": "fatal",
            "errors": [{"code": 1, "msg": "Syntax error: unexpected token"}],
        }));
        match response.into_result().unwrap_err() {
            ClientError::Execution { code, message } => {
                assert_eq!(code, 1);
                assert!(message.contains("Syntax error"));
            }
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[test]
    fn timeout_status_is_transient() {
        let response = parse(json!({"status": "timeout"}));
        let err = response.into_result().unwrap_err();
        assert!(err.is_transient());
    }
}

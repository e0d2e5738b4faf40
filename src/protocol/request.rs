//! Form payload submitted to `/query/service`.

use serde_json::Value;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

/// One statement submission: UTF-8 statement text plus execution options
/// and optional parameter bindings.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub statement: String,
    /// Dataverse context the engine resolves unqualified names against.
    pub dataverse: Option<String>,
    pub readonly: bool,
    /// Correlation id echoed back by the engine.
    pub client_context_id: String,
    /// Named parameters, bound server-side as `$name`.
    pub named_args: Vec<(String, Value)>,
}

impl QueryRequest {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            dataverse: None,
            readonly: false,
            client_context_id: Uuid::new_v4().to_string(),
            named_args: Vec::new(),
        }
    }

    pub fn with_dataverse(mut self, dataverse: Option<String>) -> Self {
        self.dataverse = dataverse;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Flatten into `application/x-www-form-urlencoded` fields.
    pub(crate) fn form_fields(&self) -> ClientResult<Vec<(String, String)>> {
        let mut fields = vec![
            ("statement".to_string(), self.statement.clone()),
            ("mode".to_string(), "immediate".to_string()),
            ("pretty".to_string(), "false".to_string()),
            ("readonly".to_string(), self.readonly.to_string()),
            (
                "client_context_id".to_string(),
                self.client_context_id.clone(),
            ),
        ];
        if let Some(dataverse) = &self.dataverse {
            fields.push(("dataverse".to_string(), dataverse.clone()));
        }
        for (name, value) in &self.named_args {
            let encoded = serde_json::to_string(value)
                .map_err(|e| ClientError::Encoding(format!("parameter '{name}': {e}")))?;
            fields.push((format!("${name}"), encoded));
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_fields_carry_statement_and_mode() {
        let request = QueryRequest::new("SELECT VALUE 1").readonly();
        let fields = request.form_fields().unwrap();
        assert!(fields.contains(&("statement".to_string(), "SELECT VALUE 1".to_string())));
        assert!(fields.contains(&("mode".to_string(), "immediate".to_string())));
        assert!(fields.contains(&("readonly".to_string(), "true".to_string())));
    }

    #[test]
    fn named_args_become_dollar_fields() {
        let mut request = QueryRequest::new("SELECT * FROM Users WHERE age > $min_age");
        request.named_args.push(("min_age".to_string(), json!(30)));
        let fields = request.form_fields().unwrap();
        assert!(fields.contains(&("$min_age".to_string(), "30".to_string())));
    }
}

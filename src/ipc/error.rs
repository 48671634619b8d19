use serde_json::json;

use crate::source::SourceError;
use crate::validate::FieldError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Failure of a single handler, rendered through [`err`].
#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        Self::new("not_found", format!("{} not found: {}", what, id))
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        tracing::debug!(fields = errors.len(), "validation failed");
        Self {
            code: "validation_failed",
            message: "form has invalid fields".to_string(),
            details: Some(json!({ "errors": errors })),
        }
    }

    /// A call to the data source failed outside of a screen load.
    pub fn source(e: SourceError) -> Self {
        tracing::warn!(kind = e.code(), error = %e, "source call failed");
        let code = match e {
            SourceError::Unauthorized => "unauthorized",
            _ => "source_failed",
        };
        Self {
            code,
            message: e.to_string(),
            details: Some(json!({ "kind": e.code() })),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

/// Render a handler result as a response line.
pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}

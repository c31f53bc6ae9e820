use serde_json::{Map, Value};

use crate::status::STATUS_CODE_RETRY;

/// Error reported by the RedPay API for a non-2xx response.
///
/// `status_code` is the network's own code (e.g. `07-006`), not the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status_code: Option<String>,
    pub operation_uuid: Option<String>,
    pub signature: Option<String>,
    pub http_status: Option<u16>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            operation_uuid: None,
            signature: None,
            http_status: None,
        }
    }

    pub fn with_status_code(mut self, status_code: impl Into<String>) -> Self {
        self.status_code = Some(status_code.into());
        self
    }

    pub fn with_operation_uuid(mut self, operation_uuid: impl Into<String>) -> Self {
        self.operation_uuid = Some(operation_uuid.into());
        self
    }

    /// Build an error from a raw HTTP response body.
    ///
    /// Bodies that are not a JSON object are kept verbatim in the message.
    pub fn from_response(http_status: u16, body: &str) -> Self {
        let fields = match serde_json::from_str::<Map<String, Value>>(body) {
            Ok(fields) => fields,
            Err(_) => {
                let mut err =
                    Self::new(format!("request failed: HTTP {} {}", http_status, body));
                err.http_status = Some(http_status);
                return err;
            }
        };

        let message = fields
            .get("message")
            .map(field_to_string)
            .unwrap_or_else(|| format!("request failed: HTTP {}", http_status));

        Self {
            message,
            status_code: fields.get("status_code").map(field_to_string),
            operation_uuid: fields.get("operation_uuid").map(field_to_string),
            signature: fields.get("signature").map(field_to_string),
            http_status: Some(http_status),
        }
    }

    pub fn status_code(&self) -> Option<&str> {
        self.status_code.as_deref()
    }

    /// Whether the remote asked the caller to retry with the canonical RETRY code.
    pub fn is_retry(&self) -> bool {
        self.status_code() == Some(STATUS_CODE_RETRY)
    }
}

fn field_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

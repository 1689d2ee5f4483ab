//! Client errors and human-readable message extraction.

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Fallback when a transport failure carries no message of its own.
pub const NETWORK_ERROR: &str = "Network error";

/// Every way a call through [`crate::ApiClient`] can fail.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response reached the client.
    #[error("{message}")]
    Network { message: String },

    /// The call exceeded the configured timeout.
    #[error("timeout of {}ms exceeded", .after.as_millis())]
    Timeout { after: Duration },

    /// The backend answered with a non-2xx status.
    #[error("Request failed with status code {}", .status.as_u16())]
    Http { status: StatusCode, data: Value },

    /// The request could not be built.
    #[error("{0}")]
    Request(String),

    /// A successful response did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Classify a reqwest failure.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout { after: timeout }
        } else if err.is_builder() {
            ApiError::Request(err.to_string())
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }

    /// Status code of the failed response, if one arrived.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Turn any client error into one message suitable for display.
///
/// Precedence: transport message (or [`NETWORK_ERROR`]) when no response
/// arrived; a non-empty string body; the first truthy `error`, `message` or
/// `detail` field; finally `Server error ({status})`. Never panics and never
/// returns an empty string.
pub fn extract_error(err: &ApiError) -> String {
    match err {
        ApiError::Http { status, data } => extract_from_body(*status, data),
        other => {
            let message = other.to_string();
            if message.trim().is_empty() {
                NETWORK_ERROR.to_string()
            } else {
                message
            }
        }
    }
}

fn extract_from_body(status: StatusCode, data: &Value) -> String {
    match data {
        Value::String(text) if !text.is_empty() => return text.clone(),
        Value::Object(fields) => {
            for key in ["error", "message", "detail"] {
                if let Some(value) = fields.get(key).filter(|v| is_truthy(v)) {
                    return match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                }
            }
        }
        _ => {}
    }
    format!("Server error ({})", status.as_u16())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http(status: u16, data: Value) -> ApiError {
        ApiError::Http {
            status: StatusCode::from_u16(status).unwrap(),
            data,
        }
    }

    #[test]
    fn test_no_response_is_never_empty() {
        let err = ApiError::Network {
            message: String::new(),
        };
        assert_eq!(extract_error(&err), "Network error");

        let err = ApiError::Network {
            message: "connection refused".into(),
        };
        assert_eq!(extract_error(&err), "connection refused");
    }

    #[test]
    fn test_timeout_message() {
        let err = ApiError::Timeout {
            after: Duration::from_secs(15),
        };
        assert_eq!(extract_error(&err), "timeout of 15000ms exceeded");
    }

    #[test]
    fn test_string_body() {
        assert_eq!(extract_error(&http(404, json!("not found"))), "not found");
    }

    #[test]
    fn test_error_field_first() {
        let err = http(500, json!({ "error": "boom", "message": "ignored" }));
        assert_eq!(extract_error(&err), "boom");
    }

    #[test]
    fn test_message_then_detail() {
        assert_eq!(extract_error(&http(400, json!({ "message": "bad dates" }))), "bad dates");
        assert_eq!(
            extract_error(&http(422, json!({ "error": "", "detail": "room taken" }))),
            "room taken"
        );
    }

    #[test]
    fn test_non_string_field_rendered_as_json() {
        let err = http(400, json!({ "error": { "code": 7 } }));
        assert_eq!(extract_error(&err), r#"{"code":7}"#);
    }

    #[test]
    fn test_fallback_to_status() {
        assert_eq!(extract_error(&http(502, json!({}))), "Server error (502)");
        assert_eq!(extract_error(&http(500, json!(""))), "Server error (500)");
        assert_eq!(extract_error(&http(503, json!(null))), "Server error (503)");
        assert_eq!(extract_error(&http(400, json!([1, 2]))), "Server error (400)");
        assert_eq!(extract_error(&http(401, json!({ "error": false }))), "Server error (401)");
    }
}

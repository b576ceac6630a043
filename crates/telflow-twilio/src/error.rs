//! Twilio client error types

use serde::Deserialize;
use telflow_provider::{ApiError, ApiErrorKind};
use thiserror::Error;

/// Error code for "Phone Number or Short Code is already in the Messaging Service"
pub const CODE_ALREADY_IN_SERVICE: i64 = 21710;
/// Error code for "The requested resource was not found"
pub const CODE_NOT_FOUND: i64 = 20404;

#[derive(Error, Debug)]
pub enum TwilioError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Twilio API error ({status}{}): {message}", fmt_code(.code))]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

pub type Result<T> = std::result::Result<T, TwilioError>;

fn fmt_code(code: &Option<i64>) -> String {
    match code {
        Some(code) => format!(", code {}", code),
        None => String::new(),
    }
}

/// Error body returned by every Twilio API
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl TwilioError {
    /// Build an API error from a non-success response
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                }
            });
        TwilioError::Api {
            status,
            code: parsed.code,
            message,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            TwilioError::Http(_) => ApiErrorKind::Transient,
            TwilioError::Api {
                status,
                code,
                message,
            } => classify(*status, *code, message),
            TwilioError::Decode { .. } | TwilioError::InvalidEndpoint(_) => ApiErrorKind::Other,
        }
    }
}

/// Map a failed response onto the engine's error kinds
pub fn classify(status: u16, code: Option<i64>, message: &str) -> ApiErrorKind {
    if code == Some(CODE_ALREADY_IN_SERVICE)
        || message.contains("already in the Messaging Service")
    {
        return ApiErrorKind::AlreadyAssociated;
    }
    if status == 404 || code == Some(CODE_NOT_FOUND) {
        return ApiErrorKind::NotFound;
    }
    match status {
        401 | 403 => ApiErrorKind::Unauthorized,
        429 | 500..=599 => ApiErrorKind::Transient,
        _ => ApiErrorKind::Other,
    }
}

impl From<TwilioError> for ApiError {
    fn from(err: TwilioError) -> Self {
        let kind = err.kind();
        match err {
            TwilioError::Api { code, message, .. } => {
                let api = ApiError::new(kind, message);
                match code {
                    Some(code) => api.with_code(code),
                    None => api,
                }
            }
            other => ApiError::new(kind, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(404, Some(20404), "not found"), ApiErrorKind::NotFound);
        assert_eq!(
            classify(
                400,
                None,
                "Phone Number or Short Code is already in the Messaging Service."
            ),
            ApiErrorKind::AlreadyAssociated
        );
        assert_eq!(classify(409, Some(21710), ""), ApiErrorKind::AlreadyAssociated);
        assert_eq!(classify(401, Some(20003), "Authenticate"), ApiErrorKind::Unauthorized);
        assert_eq!(classify(429, Some(20429), "Too Many Requests"), ApiErrorKind::Transient);
        assert_eq!(classify(503, None, "unavailable"), ApiErrorKind::Transient);
        assert_eq!(classify(400, Some(21452), "No numbers found"), ApiErrorKind::Other);
    }

    #[test]
    fn test_from_response_parses_body() {
        let err = TwilioError::from_response(
            404,
            r#"{"code": 20404, "message": "The requested resource /Keys/SK1.json was not found", "more_info": "https://www.twilio.com/docs/errors/20404", "status": 404}"#,
        );
        assert_eq!(err.kind(), ApiErrorKind::NotFound);

        let api: ApiError = err.into();
        assert_eq!(api.code, Some(20404));
        assert_eq!(
            api.message,
            "The requested resource /Keys/SK1.json was not found"
        );
    }

    #[test]
    fn test_from_response_without_json_body() {
        let err = TwilioError::from_response(502, "");
        assert_eq!(err.kind(), ApiErrorKind::Transient);
        assert_eq!(err.to_string(), "Twilio API error (502): HTTP 502");
    }
}

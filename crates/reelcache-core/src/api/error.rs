use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request failed with status {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    ResponseStatus { status: u16, message: Option<String> },

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body the service sends alongside non-2xx responses.
#[derive(Debug, Deserialize)]
struct StatusBody {
    status_message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<StatusBody>(body)
            .ok()
            .and_then(|b| b.status_message)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| Self::truncate_body(trimmed))
            });
        ApiError::ResponseStatus {
            status: status.as_u16(),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ResponseStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::ResponseStatus {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_uses_service_message() {
        let body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, body);
        assert_eq!(
            err,
            ApiError::ResponseStatus {
                status: 401,
                message: Some("Invalid API key: You must be granted a valid key.".to_string()),
            }
        );
    }

    #[test]
    fn test_from_status_truncates_plain_body() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, &body);
        match err {
            ApiError::ResponseStatus { status, message } => {
                assert_eq!(status, 502);
                let message = message.unwrap();
                assert!(message.contains("truncated, 2000 total bytes"));
                assert!(message.len() < 600);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_status_empty_body_has_no_message() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "  ");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Request failed with status 404");
    }
}

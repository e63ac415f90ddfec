use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use validator::ValidationErrors;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unauthorized - please login")]
    Unauthorized,

    #[error("HTTP {status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
        field_errors: BTreeMap<String, Vec<String>>,
    },

    #[error("failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Single line shown at the top of a form after a failed submission.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                message,
                field_errors,
                ..
            } => {
                if !field_errors.is_empty() {
                    field_errors
                        .values()
                        .flatten()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join("; ")
                } else {
                    message.clone()
                }
            }
            ApiError::Validation(errors) => validation_messages(errors).join("; "),
            ApiError::Network(_) | ApiError::Timeout => {
                "Network error - no response from server".to_string()
            }
            other => other.to_string(),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err.to_string())
        }
    }

    /// Builds a `Status` error from a non-2xx body, falling back to the raw
    /// text when the backend did not send its JSON error shape.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ApiError::Status {
                status,
                message: parsed
                    .message
                    .unwrap_or_else(|| default_status_message(status)),
                field_errors: parsed.errors.unwrap_or_default(),
            },
            Err(_) => ApiError::Status {
                status,
                message: if body.trim().is_empty() {
                    default_status_message(status)
                } else {
                    body.trim().to_string()
                },
                field_errors: BTreeMap::new(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    errors: Option<BTreeMap<String, Vec<String>>>,
}

fn default_status_message(status: StatusCode) -> String {
    match status {
        StatusCode::FORBIDDEN => "Forbidden - insufficient permissions".to_string(),
        StatusCode::NOT_FOUND => "Resource not found".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
        other => format!("Request failed with status {}", other.as_u16()),
    }
}

/// Flattens field errors into "field: message" lines, sorted by field name.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {msg}")
            })
        })
        .collect()
}

use serde_json::Value;
use thiserror::Error;

/// Every failed request lands in exactly one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No HTTP status was received
    #[error("Network error: {0}")]
    Network(String),

    /// 401. The session has been cleared by the time the caller sees this.
    #[error("Authentication is invalid - please sign in again")]
    AuthInvalid,

    #[error("{message}")]
    Validation { status: u16, message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{message}")]
    Unknown { status: Option<u16>, message: String },
}

/// Characters of a non-JSON error body kept in the message
const MAX_ERROR_BODY_CHARS: usize = 100;

impl ApiError {
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return ApiError::AuthInvalid;
        }

        let message = error_message(status, body);
        match status {
            400..=499 => ApiError::Validation { status, message },
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Unknown {
                status: Some(status),
                message,
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network(_) => None,
            ApiError::AuthInvalid => Some(401),
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Unknown { status, .. } => *status,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Unknown { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::AuthInvalid)
    }
}

/// Human-readable message for a non-2xx body.
fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => detail_message(&json).unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => {
            let text = body.trim();
            if text.is_empty() {
                format!("HTTP {}", status)
            } else {
                let truncated: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
                format!("HTTP {} - {}", status, truncated)
            }
        }
    }
}

fn detail_message(json: &Value) -> Option<String> {
    match json.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => return Some(detail.clone()),
        Some(Value::Array(entries)) if !entries.is_empty() => {
            let joined = entries
                .iter()
                .map(validation_entry)
                .collect::<Vec<_>>()
                .join(", ");
            return Some(joined);
        }
        _ => {}
    }

    ["message", "error"]
        .iter()
        .filter_map(|field| json.get(*field).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// One entry of a FastAPI-style validation list: `loc.joined: msg`.
fn validation_entry(entry: &Value) -> String {
    let msg = entry
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match entry.get("loc").and_then(Value::as_array) {
        Some(loc) => {
            let path = loc
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".");
            format!("{}: {}", path, msg)
        }
        None => msg.to_string(),
    }
}

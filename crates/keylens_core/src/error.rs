use serde_json::Value;
use thiserror::Error;

/// Message shown when the backend does not provide a usable one.
pub const DEFAULT_ERROR_MESSAGE: &str = "Something was wrong!";

/// Backend error name returned when a CLI session is no longer known.
pub const CLIENT_NOT_FOUND: &str = "ClientNotFound";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http {
        status: u16,
        name: Option<String>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Builds an HTTP error from a non-2xx status and the backend error body.
    ///
    /// The body usually looks like `{ "statusCode": 404, "message": "...", "error": "NotFound" }`.
    /// Validation failures carry `message` as an array, in which case the first entry wins.
    pub fn from_response(status: u16, body: &Value) -> Self {
        let message = match body.get("message") {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            Some(Value::Array(messages)) => messages
                .iter()
                .find_map(Value::as_str)
                .unwrap_or(DEFAULT_ERROR_MESSAGE)
                .to_string(),
            _ => DEFAULT_ERROR_MESSAGE.to_string(),
        };

        let name = body
            .get("name")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);

        ApiError::Http {
            status,
            name,
            message,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Http {
            status: 404,
            name: Some("NotFound".to_string()),
            message: message.into(),
        }
    }

    /// Human readable message for toasts and slice-level `error` strings.
    pub fn message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Network(message) if !message.is_empty() => message.clone(),
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::InvalidRequest(_) => {
                DEFAULT_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ApiError::Http { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not find {0} directory")]
    MissingDirectory(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Serialization(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_prefers_backend_body() {
        let error = ApiError::from_response(
            400,
            &json!({ "statusCode": 400, "message": "Key with this name does not exist.", "error": "NotFound" }),
        );

        assert_eq!(error.message(), "Key with this name does not exist.");
        assert_eq!(error.name(), Some("NotFound"));
        assert_eq!(error.status(), Some(400));
    }

    #[test]
    fn message_falls_back_when_body_is_empty() {
        let error = ApiError::from_response(500, &Value::Null);
        assert_eq!(error.message(), DEFAULT_ERROR_MESSAGE);
        assert_eq!(ApiError::Decode("boom".into()).message(), DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn validation_messages_use_first_entry() {
        let error = ApiError::from_response(
            400,
            &json!({ "message": ["keyName should not be empty", "ttl must be a number"] }),
        );
        assert_eq!(error.message(), "keyName should not be empty");
    }

    #[test]
    fn name_field_wins_over_error_field() {
        let error = ApiError::from_response(
            404,
            &json!({ "message": "Client not found", "name": CLIENT_NOT_FOUND, "error": "Not Found" }),
        );
        assert_eq!(error.name(), Some(CLIENT_NOT_FOUND));
        assert!(error.is_not_found());
        assert!(!error.is_cancelled());
    }
}

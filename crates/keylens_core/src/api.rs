use crate::{ApiError, CancelToken, Encoding};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single call against the backend, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub cancel: Option<CancelToken>,
    invalid: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            cancel: None,
            invalid: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Serializes `body` as the JSON payload. A failure is reported by `validate`.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(error) => self.invalid = Some(error.to_string()),
        }
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_encoding(self, encoding: Encoding) -> Self {
        self.with_query("encoding", encoding.as_str())
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        match &self.invalid {
            Some(reason) => Err(ApiError::InvalidRequest(reason.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
    pub headers: Vec<(String, String)>,
}

impl ApiResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            data,
            headers: Vec::new(),
        }
    }

    pub fn ok(data: Value) -> Self {
        Self::new(200, data)
    }

    pub fn is_successful(&self) -> bool {
        is_status_successful(self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decodes the body into the DTO the caller expects.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.data).map_err(|error| ApiError::Decode(error.to_string()))
    }
}

pub fn is_status_successful(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Backend REST collaborator.
///
/// Implementations resolve with `Ok` only for 2xx responses. Non-2xx replies
/// become `ApiError::Http`, and a request whose cancel token fires resolves
/// with `ApiError::Cancelled`.
#[async_trait]
pub trait ApiService: Send + Sync {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Affected {
        affected: i64,
    }

    #[test]
    fn json_body_and_query_are_recorded() {
        let request = ApiRequest::delete("databases/1/hash/fields")
            .json(&json!({ "fields": ["a"] }))
            .with_encoding(Encoding::Utf8);

        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.body, Some(json!({ "fields": ["a"] })));
        assert_eq!(request.query_value("encoding"), Some("utf8"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn decoding_mismatch_is_a_decode_error() {
        let response = ApiResponse::ok(json!({ "affected": 2 }));
        assert_eq!(response.json::<Affected>().unwrap().affected, 2);

        let broken = ApiResponse::ok(json!({ "affected": "two" }));
        assert!(matches!(broken.json::<Affected>(), Err(ApiError::Decode(_))));
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(is_status_successful(200));
        assert!(is_status_successful(204));
        assert!(!is_status_successful(304));
        assert!(!ApiResponse::new(404, Value::Null).is_successful());
    }
}

//! HTTP transport for the backend REST API.

use async_trait::async_trait;
use futures::future::{Either, select};
use keylens_core::{ApiError, ApiRequest, ApiResponse, ApiService, AppConfig, Method};
use log::{debug, trace};
use serde_json::Value;
use std::pin::pin;

pub struct ReqwestApiService {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestApiService {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        request.validate()?;

        let url = self.url(&request.path);
        trace!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(map_error)?;

        let response = ApiResponse {
            status,
            data: parse_body(&text),
            headers,
        };
        if !response.is_successful() {
            debug!("{} {} answered {}", request.method, url, status);
            return Err(ApiError::from_response(status, &response.data));
        }

        Ok(response)
    }
}

#[async_trait]
impl ApiService for ReqwestApiService {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let Some(token) = request.cancel.clone() else {
            return self.execute(request).await;
        };
        if token.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let call = pin!(self.execute(request));
        let cancelled = pin!(token.cancelled());
        match select(cancelled, call).await {
            Either::Left(_) => Err(ApiError::Cancelled),
            Either::Right((result, _)) => result,
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(error.to_string())
    }
}

/// Empty bodies become `null`; anything that is not JSON is kept as text.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylens_core::CancelToken;
    use serde_json::json;

    fn service(base_url: &str) -> ReqwestApiService {
        ReqwestApiService::new(&AppConfig {
            api_base_url: base_url.to_string(),
            ..AppConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn urls_join_with_a_single_slash() {
        let service = service("http://localhost:5540/api/");
        assert_eq!(
            service.url("/databases/1/keys"),
            "http://localhost:5540/api/databases/1/keys"
        );
        assert_eq!(service.url("info"), "http://localhost:5540/api/info");
    }

    #[test]
    fn bodies() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("{\"uuid\":\"u\"}"), json!({ "uuid": "u" }));
        assert_eq!(parse_body("OK"), json!("OK"));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancelToken::new();
        token.cancel();

        let request = ApiRequest::get("keys").with_cancel(token);
        let result = service("http://127.0.0.1:9").request(request).await;

        assert_eq!(result.unwrap_err(), ApiError::Cancelled);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_sending() {
        let body = std::collections::BTreeMap::from([((1, 2), 3)]);
        let request = ApiRequest::post("keys").json(&body);
        let result = service("http://127.0.0.1:9").request(request).await;

        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}

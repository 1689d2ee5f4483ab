//! The configured HTTP client every endpoint goes through.
//!
//! One `reqwest::Client` with the base path and timeout applied, plus a
//! request hook that reads the bearer token from the session store right
//! before each call.

use reqwest::header::HeaderMap;
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::store::SessionStore;

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON, or the raw text as a JSON string when the body is not
    /// JSON. An empty body is the empty string.
    pub data: Value,
}

impl ApiResponse {
    /// Deserialize the body into a concrete type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}

fn parse_data(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Client facade over the gateway.
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        url::Url::parse(&config.origin)
            .map_err(|e| ApiError::Request(format!("invalid origin '{}': {}", config.origin, e)))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            store,
        })
    }

    /// Start a request to `path` (relative to the base path), with the
    /// bearer token attached when one is stored.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.config.url(path));
        match self
            .store
            .get(&self.config.token_key)
            .filter(|t| !t.is_empty())
        {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a prepared request. Non-2xx statuses become [`ApiError::Http`].
    pub async fn send(&self, builder: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let timeout = self.config.timeout;
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(e, timeout))?;
        let data = parse_data(&bytes);

        tracing::debug!(status = %status, bytes = bytes.len(), "API response");

        if !status.is_success() {
            return Err(ApiError::Http { status, data });
        }
        Ok(ApiResponse {
            status,
            headers,
            data,
        })
    }

    pub(crate) async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::GET, path)).await
    }

    pub(crate) async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::DELETE, path)).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub(crate) async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    /// PUT with no body at all.
    pub(crate) async fn put_empty(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::PUT, path)).await
    }

    pub(crate) async fn send_multipart(
        &self,
        method: Method,
        path: &str,
        form: Form,
    ) -> Result<ApiResponse, ApiError> {
        self.send(self.request(method, path).multipart(form)).await
    }
}

//! HTTP transport seam.
//!
//! [`Transport`] is the only place a request leaves the process. [`HttpTransport`] sends it
//! with `reqwest`, keeping the backend's session cookie in its cookie store and asking for
//! JSON on every call. Tests swap in a scripted transport.

use crate::{config::ApiConfig, errors::Result};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue},
    multipart::{Form, Part},
};
use std::time::Duration;
use tracing::debug;

/// HTTP verbs the backend uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(value: Method) -> Self {
        match value {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

/// A file sent as `multipart/form-data`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field carrying the file
    pub field: String,
    /// Original file name
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
    /// Additional text fields sent alongside the file
    pub fields: Vec<(String, String)>,
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body
    Empty,
    /// JSON document
    Json(serde_json::Value),
    /// Multipart upload
    File(FilePart),
}

/// A backend request, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP verb
    pub method: Method,
    /// Path starting with `/`
    pub path: String,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// Payload
    pub body: Body,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, body: Body) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, Body::Empty)
    }

    /// `POST path` with a JSON body
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Post, path, Body::Json(body))
    }

    /// `PATCH path` with a JSON body
    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Patch, path, Body::Json(body))
    }

    /// `DELETE path`
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, Body::Empty)
    }

    /// `POST path` as a multipart upload
    pub fn upload(path: impl Into<String>, file: FilePart) -> Self {
        Self::new(Method::Post, path, Body::File(file))
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends a query parameter when `value` is present.
    #[must_use]
    pub fn with_optional_query<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with_query(key, v),
            None => self,
        }
    }
}

/// Raw backend answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Sends requests to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one request. Only failures to obtain a response are errors; non-2xx
    /// statuses are returned as responses.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// `reqwest`-backed transport with a cookie store for the session cookie
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds the client from the `[api]` configuration section.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!(method = ?request.method, path = %request.path, "Sending backend request");

        let mut builder = self
            .client
            .request(request.method.into(), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::File(file) => {
                let mut form =
                    Form::new().part(file.field, Part::bytes(file.bytes).file_name(file.file_name));
                for (key, value) in file.fields {
                    form = form.text(key, value);
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, bytes = body.len(), "Backend responded");
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_query_skips_absent_values() {
        let request = ApiRequest::get("/students")
            .with_query("page", 2)
            .with_optional_query("group_id", None::<i64>)
            .with_optional_query("search", Some("ali"));

        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("search".to_string(), "ali".to_string()),
            ]
        );
        assert_eq!(request.body, Body::Empty);
    }

    #[test]
    fn test_url_joins_without_double_slash() -> Result<()> {
        let transport = HttpTransport::new(&ApiConfig {
            base_url: "http://school.test/api/".to_string(),
            timeout_secs: 5,
        })?;
        assert_eq!(transport.url("/groups"), "http://school.test/api/groups");
        Ok(())
    }

    #[test]
    fn test_success_range() {
        let ok = ApiResponse {
            status: 204,
            body: String::new(),
        };
        let redirect = ApiResponse {
            status: 302,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }
}

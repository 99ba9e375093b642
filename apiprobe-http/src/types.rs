//! HTTP types shared across the client

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// HTTP methods supported by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Get the string representation of the HTTP method
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HttpMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(HttpMethodError::InvalidMethod(s.to_string())),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Errors that can occur when parsing HTTP methods
#[derive(Error, Debug, Clone)]
pub enum HttpMethodError {
    #[error("Invalid HTTP method: '{0}'. Supported methods are: GET, POST, PUT, DELETE")]
    InvalidMethod(String),
}

/// Per-request options: query parameters, header overrides, JSON or raw body.
///
/// Built with the `with_*` methods; an empty `RequestOptions` sends a bare
/// request with only the client's default headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Query parameters, appended to the URL in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<(String, String)>>,

    /// Header overrides, merged over the client's default headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    /// JSON body, serialized and sent with `content-type: application/json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<JsonValue>,

    /// Raw body, sent as-is; ignored when a JSON body is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_json(mut self, body: JsonValue) -> Self {
        self.json = Some(body);
        self
    }

    pub fn with_data(mut self, body: impl Into<String>) -> Self {
        self.data = Some(body.into());
        self
    }
}

/// Summary of a request as it went out on the wire, kept for cURL
/// reconstruction and report evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub method: HttpMethod,
    /// Final URL including any query string
    pub url: String,
    /// Effective headers, sorted by name
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Raw body text
    pub body: String,
    /// The request that produced this response
    pub request: SentRequest,
}

impl ApiResponse {
    /// Decode the body as JSON
    pub fn json(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Decode the body as JSON, degrading to an empty object on failure
    pub fn json_or_empty(&self) -> JsonValue {
        self.json().unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

//! Transport to the remote chat service.
//!
//! The service is consumed through exactly two operations: sending a chat
//! message and checking health. [`ChatTransport`] captures that contract so
//! the session and pipeline never depend on HTTP directly; [`HttpTransport`]
//! is the reqwest-backed implementation of it.

use std::env;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::observability;
use crate::types::{ChatReply, ChatRequest, HealthStatus};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Abstract operations consumed from the remote chat service.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one user message, correlated to a conversation by the optional
    /// session token, and return the service's reply.
    async fn send_message(&self, message: &str, session_id: Option<&str>) -> Result<ChatReply>;

    /// Probe the service's health endpoint.
    async fn check_health(&self) -> Result<HealthStatus>;
}

/// HTTP transport for the chat service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a new transport.
    ///
    /// The base URL can be provided directly or read from the RAGLINE_URL
    /// environment variable; otherwise a local default is used.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new transport with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var("RAGLINE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Create and return default headers for requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn classify_request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process a non-success response and convert it to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        // FastAPI-style error bodies carry a `detail` field.
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or_else(|| error_body.clone());

        match status_code {
            400 | 422 => Error::bad_request(detail),
            408 => Error::timeout(detail, None),
            500 => Error::internal_server(detail),
            502..=504 => Error::service_unavailable(detail, retry_after),
            _ => Error::api(status_code, detail),
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn send_message(&self, message: &str, session_id: Option<&str>) -> Result<ChatReply> {
        observability::TRANSPORT_SENDS.click();
        let url = self.endpoint("api/chat");
        let body = ChatRequest::new(message, session_id.map(String::from));

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                observability::TRANSPORT_SEND_ERRORS.click();
                self.classify_request_error(e)
            })?;

        if !response.status().is_success() {
            observability::TRANSPORT_SEND_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        response.json::<ChatReply>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse chat reply: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    async fn check_health(&self) -> Result<HealthStatus> {
        observability::TRANSPORT_PROBES.click();
        let url = self.endpoint("api/health");

        let response = self
            .client
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await
            .map_err(|e| {
                observability::TRANSPORT_PROBE_ERRORS.click();
                self.classify_request_error(e)
            })?;

        if !response.status().is_success() {
            observability::TRANSPORT_PROBE_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        response.json::<HealthStatus>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse health status: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

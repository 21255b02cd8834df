//! Captured HTTP exchanges.
//!
//! A [`CapturedResponse`] records what a named request sent and received, so
//! later requests can reference it through
//! `{{name.(response|request).(body|headers).path}}` placeholders.

use super::Headers;
use serde::{Deserialize, Serialize};

/// One completed exchange, as stored by the response capture store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Response body as text.
    pub response_body: String,

    /// Response headers, looked up case-insensitively.
    pub response_headers: Headers,

    /// The body that was sent, for `{{name.request.body...}}` references.
    pub request_body: Option<String>,

    /// The headers that were sent, for `{{name.request.headers...}}` references.
    pub request_headers: Headers,
}

impl CapturedResponse {
    /// Creates a captured exchange from its response parts.
    ///
    /// # Arguments
    ///
    /// * `status_code` - Response status code
    /// * `response_body` - Response body text
    /// * `response_headers` - Response headers
    /// * `request_body` - Body that was sent, if any
    pub fn new(
        status_code: u16,
        response_body: impl Into<String>,
        response_headers: Headers,
        request_body: Option<String>,
    ) -> Self {
        Self {
            status_code,
            response_body: response_body.into(),
            response_headers,
            request_body,
            request_headers: Headers::new(),
        }
    }

    /// Attaches the headers that were sent with the request.
    pub fn with_request_headers(mut self, headers: Headers) -> Self {
        self.request_headers = headers;
        self
    }

    /// Checks if the response indicates success (2xx status code).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.response_headers.get("content-type")
    }
}

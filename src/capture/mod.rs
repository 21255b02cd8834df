//! Response capture store.
//!
//! Holds the exchanges of named requests for one session and resolves
//! `{{name.(response|request).(body|headers).path}}` references against
//! them. Lookups never fail: a reference to a request that has not been
//! captured yet stays verbatim, and a failed body extraction yields an empty
//! string.
//!
//! The store is plain session state with no internal locking; callers share
//! it across threads only behind their own synchronization.

pub mod jsonpath;
pub mod xpath;

use crate::models::{CapturedResponse, Headers};
use crate::variables::reference::{
    replace_references, ExchangeSide, MessagePart, ResponseReference,
};
use log::{debug, trace};
use std::collections::HashMap;

pub use jsonpath::extract_json;
pub use xpath::extract_xml;

/// Session-scoped map of request name to captured exchange.
///
/// # Examples
///
/// ```
/// use restfile::capture::ResponseStore;
/// use restfile::models::Headers;
///
/// let mut store = ResponseStore::new();
/// store.capture("login", 200, r#"{"token":"abc"}"#, Headers::new(), None);
///
/// assert_eq!(
///     store.resolve_all("Bearer {{login.response.body.$.token}}"),
///     "Bearer abc"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseStore {
    entries: HashMap<String, CapturedResponse>,
}

impl ResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an exchange under `name`, replacing any previous entry with the
    /// same name (compared ignoring case).
    ///
    /// # Arguments
    ///
    /// * `name` - The request's `@name`
    /// * `status_code` - Response status code
    /// * `response_body` - Response body text
    /// * `response_headers` - Response headers
    /// * `request_body` - The body that was sent, if any
    pub fn capture(
        &mut self,
        name: &str,
        status_code: u16,
        response_body: impl Into<String>,
        response_headers: Headers,
        request_body: Option<String>,
    ) {
        self.capture_exchange(
            name,
            CapturedResponse::new(status_code, response_body, response_headers, request_body),
        );
    }

    /// Stores a complete exchange, including the request headers.
    pub fn capture_exchange(&mut self, name: &str, exchange: CapturedResponse) {
        debug!("captured response '{}' (status {})", name, exchange.status_code);
        self.entries.insert(name.to_lowercase(), exchange);
    }

    pub fn get(&self, name: &str) -> Option<&CapturedResponse> {
        self.entries.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every captured exchange. Call between independent sessions.
    pub fn clear(&mut self) {
        debug!("cleared {} captured response(s)", self.entries.len());
        self.entries.clear();
    }

    /// Resolves `text` when it is exactly one response reference.
    ///
    /// Text that is not a reference, or that names a request not yet
    /// captured, is returned unchanged.
    pub fn resolve_reference(&self, text: &str) -> String {
        match ResponseReference::parse(text) {
            Some(reference) => self.lookup(&reference, text),
            None => text.to_string(),
        }
    }

    /// Replaces every response reference in `text`, each independently.
    pub fn resolve_all(&self, text: &str) -> String {
        replace_references(text, |reference, original| self.lookup(reference, original))
    }

    fn lookup(&self, reference: &ResponseReference, original: &str) -> String {
        let Some(exchange) = self.get(&reference.name) else {
            trace!("'{}' not captured yet, keeping {}", reference.name, original);
            return original.to_string();
        };

        match reference.part {
            MessagePart::Body => {
                let body = match reference.side {
                    ExchangeSide::Response => exchange.response_body.as_str(),
                    ExchangeSide::Request => exchange.request_body.as_deref().unwrap_or(""),
                };
                extract_body(body, &reference.path)
            }
            MessagePart::Headers => {
                let headers = match reference.side {
                    ExchangeSide::Response => &exchange.response_headers,
                    ExchangeSide::Request => &exchange.request_headers,
                };
                match headers.get(&reference.path) {
                    Some(value) => value.to_string(),
                    None => original.to_string(),
                }
            }
        }
    }
}

/// Applies a body extraction path.
///
/// - `*` returns the whole body
/// - `$.`-prefixed paths are JSONPath
/// - `/`-prefixed paths are XPath
/// - anything else is JSONPath with an implied `$.`
///
/// Any failure yields an empty string.
pub fn extract_body(body: &str, path: &str) -> String {
    let path = path.trim();
    let extracted = if path == "*" {
        Some(body.to_string())
    } else if path.starts_with('/') {
        extract_xml(body, path)
    } else {
        extract_json(body, path)
    };
    extracted.unwrap_or_default()
}

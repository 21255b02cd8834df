//! HTTP request data models.
//!
//! This module defines the request structure produced by the parser, including
//! the raw (unresolved) URL, headers, body, scoped variables and the names of
//! the requests it depends on through response references.

use super::Headers;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// HTTP request method.
///
/// Represents the standard HTTP methods as defined in RFC 7231 and RFC 5789.
/// Request lines may carry other tokens; those are kept as written on the
/// request and reported with an unknown-method warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
    /// HTTP CONNECT method - establish a tunnel to the server
    CONNECT,
}

impl HttpMethod {
    /// All known methods, in declaration order.
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::DELETE,
        HttpMethod::PATCH,
        HttpMethod::OPTIONS,
        HttpMethod::HEAD,
        HttpMethod::TRACE,
        HttpMethod::CONNECT,
    ];

    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }

    /// Parses a method token, ignoring case.
    ///
    /// # Returns
    ///
    /// `Some(HttpMethod)` if the token names a known HTTP method, `None` otherwise.
    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of a request: either inline text or a reference to a file.
///
/// A file-reference body never carries inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestBody {
    /// Body lines joined with `\n`.
    Inline(String),
    /// Path written after `<` on the first body line, unresolved.
    File(String),
}

/// A request block parsed from an `.http` file.
///
/// All text fields are kept raw: placeholders such as `{{baseUrl}}` or
/// `{{login.response.body.$.token}}` are resolved at execution time by the
/// resolution pipeline, not by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Method token, uppercased. May be a token outside the known set.
    pub method: String,

    /// Target URL, unresolved.
    pub url: String,

    /// Optional HTTP version, e.g. "HTTP/1.1".
    pub http_version: Option<String>,

    /// Name set by a `# @name <identifier>` directive before the request line.
    ///
    /// Other requests refer to this request's captured exchange by this name.
    pub name: Option<String>,

    /// Free text following the `###` separator that opened this block.
    pub separator_title: Option<String>,

    /// Line of the request line in the source file (1-based).
    pub line_number: usize,

    /// Comment lines preceding the request line, markers stripped.
    /// Directive comments are not included.
    pub comments: Vec<String>,

    /// Request headers.
    pub headers: Headers,

    /// Optional body.
    pub body: Option<RequestBody>,

    /// Request-scoped variables declared between the previous separator and
    /// the request line.
    pub variables: IndexMap<String, String>,

    /// Names of requests referenced through response references, in order of
    /// first appearance, without duplicates.
    pub depends_on: Vec<String>,

    /// Whether any text of this request contains a response reference.
    pub has_response_references: bool,
}

impl HttpRequest {
    /// Creates a request with the given method and URL and empty optional parts.
    pub fn new(method: impl Into<String>, url: impl Into<String>, line_number: usize) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            http_version: None,
            name: None,
            separator_title: None,
            line_number,
            comments: Vec::new(),
            headers: Headers::new(),
            body: None,
            variables: IndexMap::new(),
            depends_on: Vec::new(),
            has_response_references: false,
        }
    }

    /// Returns the method as a known `HttpMethod`, if it is one.
    pub fn known_method(&self) -> Option<HttpMethod> {
        HttpMethod::from_token(&self.method)
    }

    /// Returns the inline body text, if the body is inline.
    pub fn body_text(&self) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Inline(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the referenced body file path, if the body is a file reference.
    pub fn body_file_path(&self) -> Option<&str> {
        match &self.body {
            Some(RequestBody::File(path)) => Some(path),
            _ => None,
        }
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// Whether this request references the captured exchange of `name`.
    pub fn depends_on_name(&self, name: &str) -> bool {
        self.depends_on.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// A label for downstream naming: the `@name`, else the separator title,
    /// else `METHOD url`.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.separator_title.clone())
            .unwrap_or_else(|| format!("{} {}", self.method, self.url))
    }
}

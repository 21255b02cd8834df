//! The parsed `.http` document.

use super::{Diagnostic, HttpRequest, Severity};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of parsing one `.http` document.
///
/// Produced once by [`crate::parser::parse`] and read-only afterwards.
/// `requests` is always in document order; the parser never reorders by
/// dependency (see [`crate::graph::execution_order`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpFile {
    /// Identifier of the source document. The engine never re-opens it.
    pub path: PathBuf,

    /// File-scoped variables, declared before the first request line.
    pub variables: IndexMap<String, String>,

    /// Requests in source order.
    pub requests: Vec<HttpRequest>,

    /// Findings accumulated while parsing, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl HttpFile {
    /// Creates an empty file model for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            variables: IndexMap::new(),
            requests: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Finds a request by its `@name`, ignoring case.
    pub fn find_request(&self, name: &str) -> Option<&HttpRequest> {
        self.requests.iter().find(|request| {
            request
                .name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    /// Position of the named request in `requests`.
    pub fn request_index(&self, name: &str) -> Option<usize> {
        self.requests.iter().position(|request| {
            request
                .name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

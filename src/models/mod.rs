//! Data models for parsed request files and captured exchanges.
//!
//! This module contains the plain data structures produced by the parser and
//! consumed by the resolution pipeline: the parsed file, its requests and
//! diagnostics, and the responses captured while a chain is executed.

pub mod diagnostic;
pub mod file;
pub mod headers;
pub mod request;
pub mod response;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use file::HttpFile;
pub use headers::Headers;
pub use request::{HttpMethod, HttpRequest, RequestBody};
pub use response::CapturedResponse;

//! Parse diagnostics.
//!
//! Diagnostics never abort parsing; the parser accumulates them on the
//! [`HttpFile`](super::HttpFile) while still producing every request it can
//! recognize.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The line was dropped or could not be understood.
    Error,
    /// The line was accepted but may not behave as intended.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// The fixed catalog of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// A line that looks like a request line but does not match
    /// `METHOD URL [HTTP/version]`.
    RequestLine,
    /// A header line without a colon, with an empty name, or a continuation
    /// line with no header to continue.
    Header,
    /// A malformed `@name = value` declaration.
    Variable,
    /// Body lines following a `< path` file reference.
    Body,
    /// A request-line method outside the known set.
    UnknownMethod,
}

impl DiagnosticCode {
    /// Returns the stable code string.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticCode::RequestLine => "request-line-error",
            DiagnosticCode::Header => "header-error",
            DiagnosticCode::Variable => "variable-error",
            DiagnosticCode::Body => "body-warning",
            DiagnosticCode::UnknownMethod => "unknown-method",
        }
    }

    /// Severity that goes with this code.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::RequestLine | DiagnosticCode::Header | DiagnosticCode::Variable => {
                Severity::Error
            }
            DiagnosticCode::Body | DiagnosticCode::UnknownMethod => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A line/column-tagged parse finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// 1-based line number
    pub line: usize,
    /// 1-based column of the first non-whitespace character of the line
    pub column: usize,
}

impl Diagnostic {
    /// Creates a diagnostic whose severity follows from its code.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            line,
            column,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]: {}",
            self.line, self.column, self.severity, self.code, self.message
        )
    }
}

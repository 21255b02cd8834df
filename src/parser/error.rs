//! Error types for `.http` parsing.
//!
//! Malformed content is never an error: it is reported through
//! [`Diagnostic`](crate::models::Diagnostic)s on the parsed file. The only
//! error the parser returns is a violated call contract.

use thiserror::Error;

/// Contract violations detected by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The file path identifying the document was empty.
    #[error("file path must not be empty")]
    EmptyPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let msg = format!("{}", ParseError::EmptyPath);
        assert!(msg.contains("file path"));
    }

    #[test]
    fn test_parse_error_equality() {
        assert_eq!(ParseError::EmptyPath, ParseError::EmptyPath.clone());
    }
}

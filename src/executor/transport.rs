//! Collaborator seams for direct execution.
//!
//! The executor resolves requests into [`PreparedRequest`]s and hands them to
//! an [`HttpTransport`]. File-referenced bodies are read through a
//! [`BodyLoader`]. Both are traits so tests and embedders can substitute
//! their own implementations.

use super::RequestError;
use crate::models::Headers;
use std::fs;
use std::io;
use std::path::Path;

/// A fully resolved request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    /// The body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// What the transport received back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub status_code: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status_code: u16, headers: Headers, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            headers,
            body: body.into(),
        }
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends prepared requests.
pub trait HttpTransport {
    fn send(&self, request: &PreparedRequest) -> Result<TransportResponse, RequestError>;
}

/// Reads the contents of `< path` body files.
pub trait BodyLoader {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads body files from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBodyLoader;

impl BodyLoader for FsBodyLoader {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fs_body_loader_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"id":1}}"#).unwrap();

        let bytes = FsBodyLoader.read_bytes(file.path()).unwrap();
        assert_eq!(bytes, br#"{"id":1}"#.to_vec());
    }

    #[test]
    fn test_fs_body_loader_missing_file() {
        let err = FsBodyLoader
            .read_bytes(Path::new("/definitely/not/here.json"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_body_text_lossy() {
        let response = TransportResponse::new(200, Headers::new(), vec![b'o', b'k', 0xff]);
        assert_eq!(response.body_text(), "ok\u{fffd}");
    }
}

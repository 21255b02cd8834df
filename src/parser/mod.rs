//! HTTP request file parser.
//!
//! This module turns the text of an `.http` file into an [`HttpFile`]: the
//! file-scoped variables, every recognizable request block and the
//! diagnostics found along the way. Parsing never fails on malformed
//! content; problems are recorded as diagnostics and the affected line is
//! skipped.
//!
//! Each request block runs through three states:
//!
//! - **Start**: blank lines, `@var = value` declarations, comments and
//!   `# @name` directives, until a request line is found.
//! - **InHeaders**: `Name: value` lines and indented continuations, until a
//!   blank line.
//! - **InBody**: every line verbatim, until the next `###` or end of input.
//!
//! A `###` line closes the current block in any state; text after it becomes
//! the separator title of the next request.

pub mod error;
pub mod line;

use crate::config::EngineConfig;
use crate::models::{Diagnostic, DiagnosticCode, HttpFile, HttpRequest, RequestBody};
use crate::variables::reference::collect_referenced_names;
pub use error::ParseError;
use indexmap::IndexMap;
use line::{classify, classify_header, first_column, separator_title, HeaderLine, LineKind, MethodTable};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static LINE_BREAK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|\r|\n").expect("Failed to compile line break regex"));

/// Matches `{{name}}` static placeholders, used to follow variables whose
/// values carry response references.
static STATIC_PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}")
        .expect("Failed to compile placeholder regex")
});

static DEFAULT_PARSER: Lazy<Parser> = Lazy::new(Parser::default);

/// Parses `.http` content with the default configuration.
///
/// # Arguments
///
/// * `content` - The full content of the request file
/// * `path` - Identifier of the document; must not be empty
///
/// # Returns
///
/// The parsed file, or `ParseError::EmptyPath` if `path` is empty.
///
/// # Examples
///
/// ```
/// use restfile::parser::parse;
///
/// let content = "GET https://api.example.com/users\n\n###\n\nDELETE https://api.example.com/users/1\n";
/// let file = parse(content, "users.http").unwrap();
/// assert_eq!(file.requests.len(), 2);
/// assert!(file.diagnostics.is_empty());
/// ```
pub fn parse(content: &str, path: impl AsRef<Path>) -> Result<HttpFile, ParseError> {
    DEFAULT_PARSER.parse(content, path)
}

/// Parses `.http` content, accepting the configured additional methods.
pub fn parse_with_config(
    content: &str,
    path: impl AsRef<Path>,
    config: &EngineConfig,
) -> Result<HttpFile, ParseError> {
    Parser::new(config).parse(content, path)
}

/// A reusable parser holding the method table it validates against.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    methods: MethodTable,
}

impl Parser {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            methods: MethodTable::with_extra(&config.additional_methods),
        }
    }

    /// Parses `content` into an [`HttpFile`] identified by `path`.
    pub fn parse(&self, content: &str, path: impl AsRef<Path>) -> Result<HttpFile, ParseError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ParseError::EmptyPath);
        }

        let mut scanner = Scanner::new(&self.methods, HttpFile::new(path));
        for (index, text) in LINE_BREAK_REGEX.split(content).enumerate() {
            scanner.feed(index + 1, text);
        }
        let file = scanner.finish();

        debug!(
            "parsed {}: {} request(s), {} diagnostic(s)",
            file.path.display(),
            file.requests.len(),
            file.diagnostics.len()
        );
        Ok(file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InHeaders,
    InBody,
}

/// Attributes collected in the Start state, attached to the next request.
#[derive(Debug, Default)]
struct Pending {
    name: Option<String>,
    separator_title: Option<String>,
    comments: Vec<String>,
    variables: IndexMap<String, String>,
}

/// The request currently being built.
#[derive(Debug)]
struct OpenRequest {
    request: HttpRequest,
    last_header: Option<String>,
    body_lines: Vec<(usize, String)>,
}

struct Scanner<'a> {
    methods: &'a MethodTable,
    file: HttpFile,
    state: State,
    seen_request: bool,
    pending: Pending,
    open: Option<OpenRequest>,
}

impl<'a> Scanner<'a> {
    fn new(methods: &'a MethodTable, file: HttpFile) -> Self {
        Self {
            methods,
            file,
            state: State::Start,
            seen_request: false,
            pending: Pending::default(),
            open: None,
        }
    }

    fn diagnostic(&mut self, code: DiagnosticCode, message: String, line_number: usize, text: &str) {
        trace!("line {}: {}: {}", line_number, code, message);
        self.file
            .diagnostics
            .push(Diagnostic::new(code, message, line_number, first_column(text)));
    }

    fn feed(&mut self, line_number: usize, text: &str) {
        if let Some(title) = separator_title(text) {
            self.close_request();
            self.pending = Pending {
                separator_title: title,
                ..Pending::default()
            };
            self.state = State::Start;
            return;
        }

        match self.state {
            State::Start => self.feed_start(line_number, text),
            State::InHeaders => self.feed_header(line_number, text),
            State::InBody => {
                if let Some(open) = self.open.as_mut() {
                    open.body_lines.push((line_number, text.to_string()));
                }
            }
        }
    }

    fn feed_start(&mut self, line_number: usize, text: &str) {
        match classify(text, self.methods) {
            LineKind::Blank | LineKind::Other | LineKind::Separator { .. } => {}
            LineKind::Variable { name, value } => {
                if self.seen_request {
                    self.pending.variables.insert(name, value);
                } else {
                    self.file.variables.insert(name, value);
                }
            }
            LineKind::MalformedVariable => self.diagnostic(
                DiagnosticCode::Variable,
                format!(
                    "Invalid variable declaration '{}'. Expected format: '@name = value'",
                    text.trim()
                ),
                line_number,
                text,
            ),
            LineKind::NameDirective(name) => self.pending.name = Some(name),
            LineKind::Comment(comment) => self.pending.comments.push(comment),
            LineKind::RequestLine {
                method,
                url,
                http_version,
            } => self.open_request(line_number, text, method, url, http_version),
            LineKind::MalformedRequestLine { token } => self.diagnostic(
                DiagnosticCode::RequestLine,
                format!(
                    "Invalid request line starting with '{}'. Expected format: 'METHOD URL [HTTP/VERSION]'",
                    token
                ),
                line_number,
                text,
            ),
        }
    }

    fn open_request(
        &mut self,
        line_number: usize,
        text: &str,
        method: String,
        url: String,
        http_version: Option<String>,
    ) {
        if !self.methods.contains(&method) {
            self.diagnostic(
                DiagnosticCode::UnknownMethod,
                format!("Unknown HTTP method '{}'", method),
                line_number,
                text,
            );
        }

        let pending = std::mem::take(&mut self.pending);
        let mut request = HttpRequest::new(method, url, line_number);
        request.http_version = http_version;
        request.name = pending.name;
        request.separator_title = pending.separator_title;
        request.comments = pending.comments;
        request.variables = pending.variables;

        self.seen_request = true;
        self.open = Some(OpenRequest {
            request,
            last_header: None,
            body_lines: Vec::new(),
        });
        self.state = State::InHeaders;
    }

    fn feed_header(&mut self, line_number: usize, text: &str) {
        if text.trim().is_empty() {
            self.state = State::InBody;
            return;
        }

        let Some(open) = self.open.as_mut() else {
            return;
        };

        match classify_header(text) {
            HeaderLine::Field { name, value } => {
                open.request.headers.insert(name.clone(), value);
                open.last_header = Some(name);
            }
            HeaderLine::Continuation(more) => {
                let target = open
                    .last_header
                    .as_deref()
                    .and_then(|name| open.request.headers.get_mut(name));
                match target {
                    Some(value) => {
                        if !more.is_empty() {
                            value.push(' ');
                            value.push_str(&more);
                        }
                    }
                    None => self.diagnostic(
                        DiagnosticCode::Header,
                        "Header continuation line without a preceding header".to_string(),
                        line_number,
                        text,
                    ),
                }
            }
            HeaderLine::Comment => {}
            HeaderLine::MissingColon => self.diagnostic(
                DiagnosticCode::Header,
                format!(
                    "Invalid header format '{}'. Expected format: 'Header-Name: value'",
                    text.trim()
                ),
                line_number,
                text,
            ),
            HeaderLine::EmptyName => self.diagnostic(
                DiagnosticCode::Header,
                format!("Header name is empty in '{}'", text.trim()),
                line_number,
                text,
            ),
        }
    }

    fn close_request(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        let OpenRequest {
            mut request,
            body_lines,
            ..
        } = open;

        request.body = self.build_body(body_lines);
        self.link_references(&mut request);

        debug!(
            "request {} at line {} ({} header(s), depends on {:?})",
            request.display_name(),
            request.line_number,
            request.headers.len(),
            request.depends_on
        );
        self.file.requests.push(request);
    }

    fn build_body(&mut self, mut lines: Vec<(usize, String)>) -> Option<RequestBody> {
        while lines.last().is_some_and(|(_, l)| l.trim().is_empty()) {
            lines.pop();
        }
        let start = lines.iter().position(|(_, l)| !l.trim().is_empty())?;

        let (first_number, first) = &lines[start];
        if let Some(path) = file_reference(first) {
            let rest = &lines[start + 1..];
            if let Some((number, dropped)) = rest.first() {
                self.diagnostic(
                    DiagnosticCode::Body,
                    format!(
                        "{} body line(s) after file reference '{}' (line {}) are ignored",
                        rest.len(),
                        path,
                        first_number
                    ),
                    *number,
                    dropped,
                );
            }
            return Some(RequestBody::File(path));
        }

        // Blank lines after the separator belong to the payload.
        let body = lines
            .iter()
            .map(|(_, l)| l.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Some(RequestBody::Inline(body))
    }

    /// Fills `depends_on` from every text that may carry a placeholder.
    fn link_references(&self, request: &mut HttpRequest) {
        let mut names = Vec::new();
        let mut texts: Vec<&str> = vec![request.url.as_str()];
        texts.extend(request.headers.iter().map(|(_, value)| value));
        match &request.body {
            Some(RequestBody::Inline(text)) | Some(RequestBody::File(text)) => texts.push(text),
            None => {}
        }

        for text in &texts {
            collect_referenced_names(text, &mut names);
        }

        // Variables used by the request may themselves hold references.
        let mut visited = Vec::new();
        for text in &texts {
            self.collect_through_variables(request, text, &mut visited, &mut names);
        }

        request.has_response_references = !names.is_empty();
        request.depends_on = names;
    }

    fn collect_through_variables(
        &self,
        request: &HttpRequest,
        text: &str,
        visited: &mut Vec<String>,
        names: &mut Vec<String>,
    ) {
        for caps in STATIC_PLACEHOLDER_REGEX.captures_iter(text) {
            let variable = &caps[1];
            if visited.iter().any(|v| v == variable) {
                continue;
            }
            visited.push(variable.to_string());

            let value = request
                .variables
                .get(variable)
                .or_else(|| self.file.variables.get(variable));
            if let Some(value) = value {
                collect_referenced_names(value, names);
                self.collect_through_variables(request, value, visited, names);
            }
        }
    }

    fn finish(mut self) -> HttpFile {
        self.close_request();
        self.file
    }
}

/// Returns the path of a `< path` body line.
fn file_reference(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix('<')?;
    let spaced = rest.starts_with(|c: char| c.is_whitespace());
    if !spaced && !rest.starts_with("./") && !rest.starts_with("../") {
        // `<root>` or `<?xml ...>`: an inline XML body.
        return None;
    }
    let path = rest.trim();
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

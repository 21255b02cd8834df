//! Line grammar for `.http` files.
//!
//! Every line is classified into a closed set of outcomes before the parser's
//! state machine acts on it. Which classifier applies depends on the state:
//! [`classify`] for lines outside a request, [`classify_header`] for the
//! header section. Body lines are only checked for separators.

use crate::models::HttpMethod;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// `METHOD URL [HTTP/version]`. The URL is a run of non-space characters or
/// `{{...}}` placeholders, which may contain spaces (`{{$timestamp -1 d}}`).
static REQUEST_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)\s+((?:\{\{[^}]*\}\}|\S)+)(?:\s+(HTTP/\d+(?:\.\d+)?))?\s*$")
        .expect("Failed to compile request line regex")
});

/// A bare absolute URL, optionally followed by an HTTP version.
static URL_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://(?:\{\{[^}]*\}\}|\S)*)(?:\s+(HTTP/\d+(?:\.\d+)?))?\s*$")
        .expect("Failed to compile URL line regex")
});

static VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@([A-Za-z_][A-Za-z0-9_.\-]*)\s*=\s*(.*?)\s*$")
        .expect("Failed to compile variable declaration regex")
});

/// `# @name login` or `// @name login`
static NAME_DIRECTIVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:#|//)\s*@name\s+([A-Za-z_][A-Za-z0-9_\-]*)\s*$")
        .expect("Failed to compile name directive regex")
});

/// Set of method tokens accepted without an unknown-method warning.
///
/// Built once from the known HTTP methods plus any configured extras and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct MethodTable {
    methods: HashSet<String>,
}

impl MethodTable {
    /// Known HTTP methods plus `extra` (compared uppercased).
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut methods: HashSet<String> = HttpMethod::ALL
            .iter()
            .map(|m| m.as_str().to_string())
            .collect();
        methods.extend(extra.into_iter().map(|m| m.as_ref().trim().to_uppercase()));
        Self { methods }
    }

    /// Whether `token` (any case) is an accepted method.
    pub fn contains(&self, token: &str) -> bool {
        self.methods.contains(&token.to_uppercase())
    }
}

impl Default for MethodTable {
    fn default() -> Self {
        Self::with_extra(std::iter::empty::<&str>())
    }
}

/// Outcome of classifying a line outside the header and body sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// `###` with optional trailing title.
    Separator { title: Option<String> },
    /// `@name = value`
    Variable { name: String, value: String },
    /// A line starting with `@` that is not a valid declaration.
    MalformedVariable,
    /// `# @name <identifier>`
    NameDirective(String),
    /// Comment text with the `#` or `//` marker stripped.
    Comment(String),
    RequestLine {
        method: String,
        url: String,
        http_version: Option<String>,
    },
    /// Starts with a known method token but does not match the request-line
    /// grammar.
    MalformedRequestLine { token: String },
    /// Anything else; ignored.
    Other,
}

/// Outcome of classifying a line in the header section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// Indented line continuing the previous header; text is trimmed.
    Continuation(String),
    Field { name: String, value: String },
    Comment,
    MissingColon,
    EmptyName,
}

/// Returns the separator title if `line` is a `###` separator.
pub fn separator_title(line: &str) -> Option<Option<String>> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix("###")?;
    let title = rest.trim_start_matches('#').trim();
    Some(if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    })
}

/// 1-based column of the first non-whitespace character.
pub fn first_column(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count() + 1
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with("//")
}

/// Classifies a line seen outside the header and body sections.
pub fn classify(line: &str, methods: &MethodTable) -> LineKind {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    if let Some(title) = separator_title(trimmed) {
        return LineKind::Separator { title };
    }

    if trimmed.starts_with('@') {
        return match VARIABLE_REGEX.captures(trimmed) {
            Some(caps) => LineKind::Variable {
                name: caps[1].to_string(),
                value: caps[2].to_string(),
            },
            None => LineKind::MalformedVariable,
        };
    }

    if is_comment(trimmed) {
        if let Some(caps) = NAME_DIRECTIVE_REGEX.captures(trimmed) {
            return LineKind::NameDirective(caps[1].to_string());
        }
        let text = trimmed
            .strip_prefix("//")
            .or_else(|| trimmed.strip_prefix('#'))
            .unwrap_or(trimmed);
        return LineKind::Comment(text.trim().to_string());
    }

    if let Some(caps) = URL_ONLY_REGEX.captures(trimmed) {
        return LineKind::RequestLine {
            method: HttpMethod::GET.as_str().to_string(),
            url: caps[1].to_string(),
            http_version: caps.get(2).map(|m| m.as_str().to_string()),
        };
    }

    if let Some(caps) = REQUEST_LINE_REGEX.captures(trimmed) {
        return LineKind::RequestLine {
            method: caps[1].to_uppercase(),
            url: caps[2].to_string(),
            http_version: caps.get(3).map(|m| m.as_str().to_string()),
        };
    }

    let token: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if !token.is_empty() && methods.contains(&token) {
        return LineKind::MalformedRequestLine {
            token: token.to_uppercase(),
        };
    }

    LineKind::Other
}

/// Classifies a line in the header section. Blank lines and separators are
/// handled by the caller.
pub fn classify_header(line: &str) -> HeaderLine {
    if line.starts_with(|c: char| c.is_whitespace()) {
        return HeaderLine::Continuation(line.trim().to_string());
    }

    let trimmed = line.trim();
    if is_comment(trimmed) {
        return HeaderLine::Comment;
    }

    match trimmed.split_once(':') {
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() {
                HeaderLine::EmptyName
            } else {
                HeaderLine::Field {
                    name: name.to_string(),
                    value: value.trim().to_string(),
                }
            }
        }
        None => HeaderLine::MissingColon,
    }
}

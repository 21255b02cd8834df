//! Response-reference placeholders.
//!
//! A response reference pulls a value out of a previously captured exchange:
//!
//! ```text
//! {{login.response.body.$.token}}
//! {{login.response.headers.X-Session-Id}}
//! {{createUser.request.body.$.email}}
//! ```
//!
//! The grammar is `{{<name>.(response|request).(body|headers).<path>}}`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Cached regex for a single response reference.
static REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\{\{\s*([A-Za-z_][A-Za-z0-9_\-]*)\.(response|request)\.(body|headers)\.([^{}]+?)\s*\}\}",
    )
    .expect("Failed to compile response reference regex")
});

/// Which side of the exchange a reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeSide {
    Response,
    Request,
}

/// Which part of the message a reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePart {
    Body,
    Headers,
}

/// A parsed response reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseReference {
    /// Name of the request whose exchange is referenced.
    pub name: String,
    pub side: ExchangeSide,
    pub part: MessagePart,
    /// Extraction path: `*`, a JSONPath, an XPath, or a header name.
    pub path: String,
}

impl ResponseReference {
    /// Parses `text` when it consists of exactly one reference (surrounding
    /// whitespace allowed).
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let caps = REFERENCE_REGEX.captures(trimmed)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != trimmed.len() {
            return None;
        }
        Self::from_captures(&caps)
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<Self> {
        let side = match caps.get(2)?.as_str() {
            "response" => ExchangeSide::Response,
            _ => ExchangeSide::Request,
        };
        let part = match caps.get(3)?.as_str() {
            "body" => MessagePart::Body,
            _ => MessagePart::Headers,
        };
        Some(Self {
            name: caps.get(1)?.as_str().to_string(),
            side,
            part,
            path: caps.get(4)?.as_str().trim().to_string(),
        })
    }
}

/// Finds every response reference in `text`, with the byte range of each
/// placeholder.
pub fn find_references(text: &str) -> Vec<(Range<usize>, ResponseReference)> {
    if !text.contains("{{") {
        return Vec::new();
    }

    REFERENCE_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let range = caps.get(0)?.range();
            ResponseReference::from_captures(&caps).map(|reference| (range, reference))
        })
        .collect()
}

/// Replaces every response reference in `text` with the output of `replace`.
///
/// `replace` receives the parsed reference and the original placeholder text.
pub fn replace_references<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&ResponseReference, &str) -> String,
{
    if !text.contains("{{") {
        return text.to_string();
    }

    REFERENCE_REGEX
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let original = &caps[0];
            match ResponseReference::from_captures(caps) {
                Some(reference) => replace(&reference, original),
                None => original.to_string(),
            }
        })
        .into_owned()
}

/// Appends the request names referenced in `text` to `names`, skipping names
/// already present (compared ignoring case).
pub fn collect_referenced_names(text: &str, names: &mut Vec<String>) {
    for (_, reference) in find_references(text) {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(&reference.name)) {
            names.push(reference.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_body_reference() {
        let reference = ResponseReference::parse("{{login.response.body.$.token}}").unwrap();
        assert_eq!(reference.name, "login");
        assert_eq!(reference.side, ExchangeSide::Response);
        assert_eq!(reference.part, MessagePart::Body);
        assert_eq!(reference.path, "$.token");
    }

    #[test]
    fn test_parse_request_headers_reference() {
        let reference =
            ResponseReference::parse("{{ create-user.request.headers.Content-Type }}").unwrap();
        assert_eq!(reference.name, "create-user");
        assert_eq!(reference.side, ExchangeSide::Request);
        assert_eq!(reference.part, MessagePart::Headers);
        assert_eq!(reference.path, "Content-Type");
    }

    #[test]
    fn test_parse_rejects_surrounding_text() {
        assert!(ResponseReference::parse("Bearer {{login.response.body.$.token}}").is_none());
        assert!(ResponseReference::parse("{{baseUrl}}").is_none());
        assert!(ResponseReference::parse("{{login.response.cookies.x}}").is_none());
    }

    #[test]
    fn test_find_references_in_text() {
        let text = "{{a.response.body.*}} and {{b.response.headers.ETag}} and {{c}}";
        let found = find_references(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].1.name, "a");
        assert_eq!(found[0].1.path, "*");
        assert_eq!(&text[found[1].0.clone()], "{{b.response.headers.ETag}}");
    }

    #[test]
    fn test_xpath_reference() {
        let found = find_references("{{svc.response.body./root/item[@id='2']/name}}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.path, "/root/item[@id='2']/name");
    }

    #[test]
    fn test_collect_referenced_names_dedups() {
        let mut names = Vec::new();
        collect_referenced_names(
            "{{login.response.body.$.a}} {{Login.response.body.$.b}} {{user.response.body.*}}",
            &mut names,
        );
        assert_eq!(names, vec!["login".to_string(), "user".to_string()]);
    }

    #[test]
    fn test_replace_references() {
        let out = replace_references("x={{a.response.body.$.id}};y={{q}}", |r, _| {
            format!("<{}>", r.name)
        });
        assert_eq!(out, "x=<a>;y={{q}}");
    }
}

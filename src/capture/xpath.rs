//! Single-node XPath queries over XML bodies.
//!
//! Only the subset needed by response references is supported:
//!
//! - absolute steps (`/root/item/name`) and descendant steps (`//name`)
//! - `*` name tests
//! - positional predicates (`item[2]`, 1-based) and attribute equality
//!   predicates (`item[@id='2']`)
//! - a trailing `@attr` or `text()` step
//!
//! The body is read with quick-xml into a small element tree; the first
//! matching node's text content is returned.

use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of this element and all descendants.
    fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Text nodes directly under this element.
    fn own_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    fn descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in self.elements() {
            out.push(child);
            child.descendants(out);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    AttributeEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Element {
        axis: Axis,
        name: String,
        predicate: Option<Predicate>,
    },
    Attribute(String),
    Text,
}

/// Evaluates `path` against the XML document in `body`.
///
/// # Returns
///
/// The text content of the first matching node, or `None` if the body is
/// not well-formed XML, the path is outside the supported subset, or
/// nothing matches.
pub fn extract_xml(body: &str, path: &str) -> Option<String> {
    let steps = parse_path(path)?;
    let document = parse_document(body)?;

    let mut context: Vec<&Element> = vec![&document];
    for step in &steps {
        match step {
            Step::Element {
                axis,
                name,
                predicate,
            } => {
                let mut next = Vec::new();
                for element in &context {
                    let candidates: Vec<&Element> = match axis {
                        Axis::Child => element.elements().collect(),
                        Axis::Descendant => {
                            let mut all = Vec::new();
                            element.descendants(&mut all);
                            all
                        }
                    };
                    let matching = candidates.into_iter().filter(|e| name_matches(name, &e.name));
                    match predicate {
                        None => next.extend(matching),
                        Some(Predicate::Position(n)) => next.extend(matching.skip(n - 1).take(1)),
                        Some(Predicate::AttributeEquals(attr, value)) => next.extend(
                            matching.filter(|e| e.attribute(attr) == Some(value.as_str())),
                        ),
                    }
                }
                if next.is_empty() {
                    return None;
                }
                context = next;
            }
            Step::Attribute(attr) => {
                return context
                    .iter()
                    .find_map(|e| e.attribute(attr))
                    .map(str::to_string)
            }
            Step::Text => return context.first().map(|e| e.own_text()),
        }
    }

    context.first().map(|e| e.text_content())
}

fn name_matches(test: &str, name: &str) -> bool {
    if test == "*" || test == name {
        return true;
    }
    // Unprefixed tests match prefixed names by local part.
    !test.contains(':') && name.rsplit(':').next() == Some(test)
}

fn parse_path(path: &str) -> Option<Vec<Step>> {
    let mut rest = path.trim();
    if !rest.starts_with('/') {
        return None;
    }

    let mut steps = Vec::new();
    while !rest.is_empty() {
        let axis = if let Some(r) = rest.strip_prefix("//") {
            rest = r;
            Axis::Descendant
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
            Axis::Child
        } else {
            return None;
        };

        let end = step_end(rest);
        let raw = &rest[..end];
        rest = &rest[end..];

        if matches!(steps.last(), Some(Step::Attribute(_)) | Some(Step::Text)) {
            return None;
        }

        if let Some(attr) = raw.strip_prefix('@') {
            if attr.is_empty() || axis == Axis::Descendant {
                return None;
            }
            steps.push(Step::Attribute(attr.to_string()));
        } else if raw == "text()" {
            steps.push(Step::Text);
        } else {
            steps.push(parse_element_step(axis, raw)?);
        }
    }

    if steps.is_empty() {
        None
    } else {
        Some(steps)
    }
}

/// Byte offset of the next `/` outside a predicate.
fn step_end(rest: &str) -> usize {
    let mut depth = 0usize;
    for (i, ch) in rest.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => return i,
            _ => {}
        }
    }
    rest.len()
}

fn parse_element_step(axis: Axis, raw: &str) -> Option<Step> {
    let (name, predicate) = match raw.split_once('[') {
        Some((name, pred)) => {
            let pred = pred.strip_suffix(']')?.trim();
            (name, Some(parse_predicate(pred)?))
        }
        None => (raw, None),
    };

    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some(Step::Element {
        axis,
        name: name.to_string(),
        predicate,
    })
}

fn parse_predicate(pred: &str) -> Option<Predicate> {
    if let Some(attr) = pred.strip_prefix('@') {
        let (name, value) = attr.split_once('=')?;
        let value = value.trim();
        let value = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))?;
        return Some(Predicate::AttributeEquals(
            name.trim().to_string(),
            value.to_string(),
        ));
    }

    match pred.parse::<usize>() {
        Ok(n) if n >= 1 => Some(Predicate::Position(n)),
        _ => None,
    }
}

fn element_from(e: &quick_xml::events::BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                String::from_utf8_lossy(&attr.value).to_string(),
            )
        })
        .collect();
    Element {
        name,
        attributes,
        children: Vec::new(),
    }
}

/// Deepest element nesting accepted before a document is rejected.
const MAX_DEPTH: usize = 128;

/// Appends character data to the open element, preceded by any whitespace
/// held back since the last markup event.
fn push_text(stack: &mut [Element], pending: &mut Option<String>, text: String) -> Option<()> {
    let text = match pending.take() {
        Some(mut space) => {
            space.push_str(&text);
            space
        }
        None => text,
    };
    stack.last_mut()?.children.push(Node::Text(text));
    Some(())
}

/// Reads `xml` into a tree under a virtual document element.
///
/// Returns `None` for malformed markup or nesting deeper than `MAX_DEPTH`.
fn parse_document(xml: &str) -> Option<Element> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = vec![Element::default()];
    // Whitespace-only text is indentation unless more character data follows.
    let mut pending: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                pending = None;
                stack.push(element_from(e));
                if stack.len() > MAX_DEPTH + 1 {
                    return None;
                }
            }
            Ok(Event::Empty(ref e)) => {
                pending = None;
                let element = element_from(e);
                stack.last_mut()?.children.push(Node::Element(element));
            }
            Ok(Event::End(ref e)) => {
                pending = None;
                let closing = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if stack.len() < 2 {
                    return None;
                }
                let element = stack.pop()?;
                if element.name != closing {
                    return None;
                }
                stack.last_mut()?.children.push(Node::Element(element));
            }
            Ok(Event::Text(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                if text.trim().is_empty() {
                    pending.get_or_insert_with(String::new).push_str(&text);
                } else {
                    push_text(&mut stack, &mut pending, text)?;
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                let resolved = match e.resolve_char_ref() {
                    Ok(Some(ch)) => Some(ch.to_string()),
                    _ => e
                        .decode()
                        .ok()
                        .and_then(|name| predefined_entity(&name))
                        .map(str::to_string),
                };
                if let Some(text) = resolved {
                    push_text(&mut stack, &mut pending, text)?;
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                push_text(&mut stack, &mut pending, text)?;
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return None;
    }
    let document = stack.pop()?;
    if document.elements().next().is_none() {
        return None;
    }
    Some(document)
}

fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    }
}

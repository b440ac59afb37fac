//! Tree building on top of the html5gum tokenizer.

use core::fmt;

use html5gum::{State, Token, Tokenizer};

use crate::node::{Element, Node};
use crate::serializer;
use crate::tracing_macros::trace;

/// HTML parsing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlError {
    /// General parse error with message.
    ParseError(String),
    /// Invalid UTF-8 in input.
    InvalidUtf8,
}

impl fmt::Display for HtmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HtmlError::ParseError(msg) => write!(f, "HTML parse error: {msg}"),
            HtmlError::InvalidUtf8 => write!(f, "Invalid UTF-8 in HTML"),
        }
    }
}

impl std::error::Error for HtmlError {}

/// HTML void elements that cannot have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub(crate) fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|&v| v.eq_ignore_ascii_case(name))
}

/// Parse markup into a list of top-level nodes.
///
/// Comments and doctypes are kept as nodes. Stray end tags are dropped and
/// elements still open at the end of input are closed there.
pub fn parse_fragment(input: &str) -> Result<Vec<Node>, HtmlError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();

    while let Some(token_result) = tokenizer.next() {
        let token = token_result.map_err(|_| HtmlError::ParseError("tokenizer error".into()))?;

        match token {
            Token::StartTag(tag) => {
                let name = String::from_utf8_lossy(&tag.name).to_ascii_lowercase();
                let attrs: Vec<(String, String)> = tag
                    .attributes
                    .iter()
                    .map(|(k, v)| {
                        (
                            String::from_utf8_lossy(k).into_owned(),
                            String::from_utf8_lossy(v).into_owned(),
                        )
                    })
                    .collect();

                let elem = Element {
                    name,
                    attrs,
                    children: Vec::new(),
                };

                if tag.self_closing || is_void_element(&elem.name) {
                    attach(&mut stack, Node::Element(elem), &mut roots);
                } else {
                    // Switch tokenizer state for raw text elements per HTML5 spec
                    match elem.name.as_str() {
                        "script" | "style" => tokenizer.set_state(State::ScriptData),
                        "textarea" | "title" => tokenizer.set_state(State::RcData),
                        _ => {}
                    }
                    stack.push(elem);
                }
            }
            Token::EndTag(tag) => {
                let end_name = String::from_utf8_lossy(&tag.name).to_ascii_lowercase();

                match stack.iter().rposition(|elem| elem.name == end_name) {
                    Some(idx) => {
                        while stack.len() > idx {
                            if let Some(elem) = stack.pop() {
                                attach(&mut stack, Node::Element(elem), &mut roots);
                            }
                        }
                    }
                    None => {
                        trace!(tag = %end_name, "ignoring stray end tag");
                    }
                }
            }
            Token::String(text) => {
                push_text(&mut stack, &mut roots, &String::from_utf8_lossy(&text));
            }
            Token::Comment(body) => {
                let body = String::from_utf8_lossy(&body).into_owned();
                attach(&mut stack, Node::Comment(body), &mut roots);
            }
            Token::Doctype(doctype) => {
                let name = String::from_utf8_lossy(&doctype.name).to_ascii_lowercase();
                attach(&mut stack, Node::Doctype(name), &mut roots);
            }
            Token::Error(_) => {
                // The tokenizer recovers from every error; keep going like a browser would.
            }
        }
    }

    while let Some(elem) = stack.pop() {
        attach(&mut stack, Node::Element(elem), &mut roots);
    }

    Ok(roots)
}

/// Parse raw bytes, failing if they are not UTF-8.
pub fn parse_bytes(input: &[u8]) -> Result<Vec<Node>, HtmlError> {
    let input = core::str::from_utf8(input).map_err(|_| HtmlError::InvalidUtf8)?;
    parse_fragment(input)
}

/// Attach a node to its parent or to the roots list.
fn attach(stack: &mut [Element], node: Node, roots: &mut Vec<Node>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Push text content, preserving all whitespace exactly as in the source HTML.
fn push_text(stack: &mut [Element], roots: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    let siblings = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => roots,
    };
    if let Some(Node::Text(existing)) = siblings.last_mut() {
        existing.push_str(text);
    } else {
        siblings.push(Node::Text(text.to_string()));
    }
}

/// A full HTML document: optional doctype plus an `html` element that holds
/// exactly one `head` and one `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Doctype name, if the source declared one.
    pub doctype: Option<String>,
    /// Attributes of the `html` element.
    pub attrs: Vec<(String, String)>,
    /// The `head` element.
    pub head: Element,
    /// The `body` element.
    pub body: Element,
}

/// Elements that belong in `head` when they appear before any body content.
const HEAD_ELEMENTS: &[&str] = &[
    "base", "link", "meta", "noscript", "script", "style", "template", "title",
];

impl Document {
    /// Parse and normalize a document.
    ///
    /// Missing `html`, `head` or `body` elements are synthesized. Top-level
    /// content outside `head` ends up in `body`.
    pub fn parse(input: &str) -> Result<Self, HtmlError> {
        let nodes = parse_fragment(input)?;

        let mut doctype = None;
        let mut attrs = Vec::new();
        let mut loose = Vec::new();
        for node in nodes {
            match node {
                Node::Doctype(name) => {
                    doctype.get_or_insert(name);
                }
                Node::Element(e) if e.name == "html" => {
                    attrs.extend(e.attrs);
                    loose.extend(e.children);
                }
                other => loose.push(other),
            }
        }

        let mut head: Option<Element> = None;
        let mut body = Element::new("body");
        let mut in_body = false;
        let mut explicit_body = false;
        for node in loose {
            match node {
                Node::Element(e) if e.name == "head" && head.is_none() && !in_body => {
                    head = Some(e);
                }
                Node::Element(e) if e.name == "body" => {
                    in_body = true;
                    explicit_body = true;
                    body.attrs.extend(e.attrs);
                    body.children.extend(e.children);
                }
                Node::Element(e)
                    if !in_body && HEAD_ELEMENTS.iter().any(|h| h.eq_ignore_ascii_case(&e.name)) =>
                {
                    head.get_or_insert_with(|| Element::new("head"))
                        .children
                        .push(Node::Element(e));
                }
                // Inter-element whitespace outside an explicit body is dropped.
                Node::Text(t) if t.trim().is_empty() && (!in_body || explicit_body) => {}
                other => {
                    if matches!(other, Node::Element(_) | Node::Text(_)) {
                        in_body = true;
                    }
                    body.children.push(other);
                }
            }
        }

        Ok(Self {
            doctype,
            attrs,
            head: head.unwrap_or_else(|| Element::new("head")),
            body,
        })
    }

    /// First element (pre-order, `head` before `body`) with the given tag name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        [&self.head, &self.body].into_iter().find_map(|e| {
            if e.name.eq_ignore_ascii_case(name) {
                Some(e)
            } else {
                e.find(name)
            }
        })
    }

    /// Serialize the whole document, doctype included.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(name) = &self.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        serializer::write_open_tag("html", &self.attrs, &mut out);
        serializer::write_element(&self.head, &mut out);
        serializer::write_element(&self.body, &mut out);
        out.push_str("</html>");
        out
    }
}

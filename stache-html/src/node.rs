//! Owned element trees.

use crate::parser::{HtmlError, parse_fragment};
use crate::serializer;

/// A node in an element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with its attributes and children.
    Element(Element),
    /// Text content, stored unescaped.
    Text(String),
    /// A comment; the string is the body between `<!--` and `-->`.
    Comment(String),
    /// A doctype declaration; the string is its name (usually `html`).
    Doctype(String),
}

impl Node {
    /// Returns `Some(&Element)` if this is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `Some(&mut Element)` if this is an element.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Serialize this node to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        serializer::write_node(self, false, &mut out);
        out
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_owned())
    }
}

/// An HTML element.
///
/// Tag names are lower-case. Attributes keep the order they were given in;
/// the tokenizer reports them sorted by name, so parsed trees serialize
/// deterministically. Cloning is a deep copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag name (lowercase).
    pub name: String,
    /// Attributes as (name, value) pairs.
    pub attrs: Vec<(String, String)>,
    /// Child nodes, in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create a new element with just a tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Add a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Add text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Get an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over child elements (skipping text, comments and doctypes).
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Get the combined text content (concatenated from all descendant text).
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        collect_text(&self.children, &mut result);
        result
    }

    /// First descendant element (pre-order) with the given tag name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.name.eq_ignore_ascii_case(name) {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable variant of [`Element::find`].
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        for child in self.children.iter_mut().filter_map(Node::as_element_mut) {
            if child.name.eq_ignore_ascii_case(name) {
                return Some(child);
            }
            if let Some(found) = child.find_mut(name) {
                return Some(found);
            }
        }
        None
    }

    /// Serialize the children of this element.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        let raw = serializer::is_raw_text_element(&self.name);
        for child in &self.children {
            serializer::write_node(child, raw, &mut out);
        }
        out
    }

    /// Serialize this element including its own tags.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        serializer::write_element(self, &mut out);
        out
    }

    /// Replace all children with the nodes parsed from `markup`.
    pub fn set_inner_html(&mut self, markup: &str) -> Result<(), HtmlError> {
        self.children = parse_fragment(markup)?;
        Ok(())
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
            Node::Comment(_) | Node::Doctype(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_is_pre_order() {
        let root = Element::new("div")
            .with_child(Element::new("section").with_child(Element::new("p").with_text("deep")))
            .with_child(Element::new("p").with_text("shallow"));
        assert_eq!(root.find("p").unwrap().text_content(), "deep");
        assert!(root.find("span").is_none());
    }

    #[test]
    fn set_inner_html_replaces_children() {
        let mut root = Element::new("div").with_text("old");
        root.set_inner_html("<b>new</b> text").unwrap();
        assert_eq!(root.inner_html(), "<b>new</b> text");
        assert_eq!(root.outer_html(), "<div><b>new</b> text</div>");
    }

    #[test]
    fn clone_is_independent() {
        let original = Element::new("ul").with_child(Element::new("li").with_text("a"));
        let mut copy = original.clone();
        copy.find_mut("li").unwrap().children.clear();
        assert_eq!(original.text_content(), "a");
        assert_eq!(copy.text_content(), "");
    }
}

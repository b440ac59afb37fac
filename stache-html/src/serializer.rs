//! Markup serialization for element trees.
//!
//! Output is minified: no whitespace is added or removed, so a parsed
//! fragment serializes back to its source modulo attribute order, quoting
//! and character-reference normalization.

use crate::node::{Element, Node};
use crate::parser::is_void_element;

/// HTML5 raw text elements where content should NOT be HTML-escaped.
/// See: <https://html.spec.whatwg.org/multipage/parsing.html#raw-text-elements>
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Check if an element is a raw text element (content should not be HTML-escaped).
pub(crate) fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS
        .iter()
        .any(|&v| v.eq_ignore_ascii_case(name))
}

pub(crate) fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Element(e) => write_element(e, out),
        Node::Text(t) if raw_text => out.push_str(t),
        Node::Text(t) => write_text_escaped(t, out),
        Node::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
        Node::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
    }
}

pub(crate) fn write_element(elem: &Element, out: &mut String) {
    write_open_tag(&elem.name, &elem.attrs, out);
    if is_void_element(&elem.name) {
        return;
    }
    let raw = is_raw_text_element(&elem.name);
    for child in &elem.children {
        write_node(child, raw, out);
    }
    out.push_str("</");
    out.push_str(&elem.name);
    out.push('>');
}

pub(crate) fn write_open_tag(name: &str, attrs: &[(String, String)], out: &mut String) {
    out.push('<');
    out.push_str(name);
    for (k, v) in attrs {
        out.push(' ');
        out.push_str(k);
        if !v.is_empty() {
            out.push_str("=\"");
            write_attr_escaped(v, out);
            out.push('"');
        }
    }
    out.push('>');
}

fn write_text_escaped(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn write_attr_escaped(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_special_chars() {
        let p = Element::new("p").with_text("a < b & c");
        assert_eq!(p.outer_html(), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_attribute_escaping() {
        let a = Element::new("a").with_attr("title", "say \"hi\" <now>");
        assert_eq!(
            a.outer_html(),
            "<a title=\"say &quot;hi&quot; &lt;now&gt;\"></a>"
        );
    }

    #[test]
    fn test_empty_attribute_is_bare() {
        let input = Element::new("input").with_attr("disabled", "");
        assert_eq!(input.outer_html(), "<input disabled>");
    }

    #[test]
    fn test_script_not_escaped() {
        let script = Element::new("script").with_text("a && b < c");
        assert_eq!(script.outer_html(), "<script>a && b < c</script>");
    }

    #[test]
    fn test_comment_verbatim() {
        let mut div = Element::new("div");
        div.children.push(Node::Comment("stache:#items".into()));
        assert_eq!(div.outer_html(), "<div><!--stache:#items--></div>");
    }
}

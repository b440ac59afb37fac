//! Guard codec: hides mustache tags inside HTML comments.
//!
//! `{{#items}}` is not markup, and an HTML tree builder is free to split,
//! escape or drop it. Encoding turns every tag into a comment of the form
//! `<!--stache:{sigil}{name}-->` before parsing, and decoding turns the
//! comments back into tags afterwards. Comments that end up inside an
//! attribute value come back from the serializer entity-escaped
//! (`&lt;!--stache:url--&gt;`), so decoding accepts both spellings.
//!
//! The `{{content}}` tag is special: it becomes the fixed sentinel
//! [`CONTENT_SENTINEL`], which marks where projected content goes during
//! assembly. Decoding leaves it alone.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};

/// Marks the content projection point in encoded markup.
pub const CONTENT_SENTINEL: &str = "<!--stache-content-->";

/// Tag name that encodes to [`CONTENT_SENTINEL`].
pub const CONTENT_TAG: &str = "content";

/// `{{ sigil? name }}` with optional inner whitespace.
pub(crate) static MUSTACHE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([>#/^!]?)\s*([A-Za-z0-9._$-]+)\s*\}\}").expect("valid tag pattern")
});

/// `<!--stache:{sigil}{name}-->`, raw or entity-escaped.
pub(crate) static GUARD_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:<|&lt;)!--stache:([>#/^!]?)\s*([A-Za-z0-9._$-]+)--(?:>|&gt;)")
        .expect("valid guard pattern")
});

static CONTENT_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:<|&lt;)!--stache-content--(?:>|&gt;)").expect("valid sentinel pattern")
});

/// Replace every mustache tag in `text` with its guard comment.
pub fn encode(text: &str) -> String {
    MUSTACHE_TAG
        .replace_all(text, |caps: &Captures<'_>| {
            let (sigil, name) = (&caps[1], &caps[2]);
            if name == CONTENT_TAG {
                CONTENT_SENTINEL.to_string()
            } else {
                format!("<!--stache:{sigil}{name}-->")
            }
        })
        .into_owned()
}

/// Replace every guard comment in `text` with the mustache tag it stands for.
pub fn decode(text: &str) -> String {
    GUARD_TAG
        .replace_all(text, |caps: &Captures<'_>| {
            let (sigil, name) = (&caps[1], &caps[2]);
            format!("{{{{{sigil}{name}}}}}")
        })
        .into_owned()
}

/// Substitute `content` for every content sentinel in `markup`, in one pass.
///
/// Borrows when there is no sentinel to fill.
pub fn fill_content<'a>(markup: &'a str, content: &str) -> Cow<'a, str> {
    CONTENT_GUARD.replace_all(markup, NoExpand(content))
}

/// Whether `markup` still holds an unfilled content sentinel.
pub fn has_content_sentinel(markup: &str) -> bool {
    CONTENT_GUARD.is_match(markup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_each_sigil() {
        assert_eq!(encode("{{name}}"), "<!--stache:name-->");
        assert_eq!(encode("{{#items}}"), "<!--stache:#items-->");
        assert_eq!(encode("{{^items}}"), "<!--stache:^items-->");
        assert_eq!(encode("{{/items}}"), "<!--stache:/items-->");
        assert_eq!(encode("{{!note}}"), "<!--stache:!note-->");
        assert_eq!(encode("{{>header}}"), "<!--stache:>header-->");
    }

    #[test]
    fn encode_trims_inner_whitespace() {
        assert_eq!(encode("{{ # items }}"), "<!--stache:#items-->");
        assert_eq!(decode(&encode("{{ user.name }}")), "{{user.name}}");
    }

    #[test]
    fn content_becomes_sentinel() {
        assert_eq!(encode("<main>{{content}}</main>"), "<main><!--stache-content--></main>");
        assert_eq!(encode("{{ content }}"), CONTENT_SENTINEL);
        assert_ne!(encode("{{content}}"), encode("{{contents}}"));
    }

    #[test]
    fn decode_leaves_sentinel() {
        assert_eq!(decode(CONTENT_SENTINEL), CONTENT_SENTINEL);
    }

    #[test]
    fn decode_accepts_escaped_guards() {
        assert_eq!(
            decode("<a href=\"&lt;!--stache:url--&gt;\">"),
            "<a href=\"{{url}}\">"
        );
        assert_eq!(decode("&lt;!--stache:#list-->"), "{{#list}}");
    }

    #[test]
    fn malformed_tags_pass_through() {
        let text = "{{ unclosed } and {{bad name}} and {{}}";
        assert_eq!(encode(text), text);
    }

    #[test]
    fn fill_content_borrows_without_sentinel() {
        assert!(matches!(fill_content("<p>x</p>", "y"), Cow::Borrowed(_)));
    }

    #[test]
    fn fill_content_does_not_expand_dollars() {
        assert_eq!(
            fill_content("<main><!--stache-content--></main>", "$1 ${name}"),
            "<main>$1 ${name}</main>"
        );
    }

    #[test]
    fn fill_content_accepts_escaped_sentinel() {
        let markup = "<textarea>&lt;!--stache-content--&gt;</textarea>\
                      <a title=\"&lt;!--stache-content--&gt;\"><!--stache-content--></a>";
        assert!(has_content_sentinel("&lt;!--stache-content--&gt;"));
        assert_eq!(
            fill_content(markup, "hi"),
            "<textarea>hi</textarea><a title=\"hi\">hi</a>"
        );
    }
}

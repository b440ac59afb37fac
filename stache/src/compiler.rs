//! Mustache to JavaScript template-literal compiler.
//!
//! The output is the body of a tagged template literal evaluated by the
//! client runtime with `$` bound to the data and `$$` to the current
//! context:
//!
//! | tag           | emitted                                          |
//! |---------------|--------------------------------------------------|
//! | `{{name}}`    | `${$$.name}`                                     |
//! | `{{.}}`       | `${$$}`                                          |
//! | `{{$x}}`      | `${$x}`                                          |
//! | `{{#list}}`   | `` ${arr($$.list).map(($$,_i)=>{return html` ``  |
//! | `{{^list}}`   | `` ${rearr($$.list).map(($$,_i)=>{return html` ``|
//! | `{{/list}}`   | `` `})} ``                                       |
//! | `{{!note}}`   | nothing                                          |
//!
//! Partials (`{{>name}}`) are not supported and fail compilation.

use core::fmt;

use regex::Regex;
use serde_json::Value;

use crate::guard::{GUARD_TAG, MUSTACHE_TAG};
use crate::tracing_macros::{trace, trace_span};

/// Which spelling of tags to scan for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Plain `{{ }}` tags.
    Mustache,
    /// Guard comments as produced by [`crate::guard::encode`].
    Guarded,
}

impl Grammar {
    fn pattern(self) -> &'static Regex {
        match self {
            Grammar::Mustache => &MUSTACHE_TAG,
            Grammar::Guarded => &GUARD_TAG,
        }
    }
}

/// What a tag does, selected by its sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// No sigil: interpolate a value.
    Variable,
    /// `#`: open a section.
    SectionOpen,
    /// `^`: open a section iterated in reverse.
    SectionOpenReversed,
    /// `/`: close the innermost section.
    SectionClose,
    /// `!`: a comment.
    Comment,
    /// `>`: a partial reference.
    PartialRef,
}

impl TagKind {
    /// Kind for a sigil; anything unrecognized is a variable.
    pub fn from_sigil(sigil: &str) -> Self {
        match sigil {
            "#" => TagKind::SectionOpen,
            "^" => TagKind::SectionOpenReversed,
            "/" => TagKind::SectionClose,
            "!" => TagKind::Comment,
            ">" => TagKind::PartialRef,
            _ => TagKind::Variable,
        }
    }

    /// The sigil written before the tag name.
    pub fn sigil(self) -> &'static str {
        match self {
            TagKind::Variable => "",
            TagKind::SectionOpen => "#",
            TagKind::SectionOpenReversed => "^",
            TagKind::SectionClose => "/",
            TagKind::Comment => "!",
            TagKind::PartialRef => ">",
        }
    }
}

/// One parsed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// What the tag does.
    pub kind: TagKind,
    /// The name: a dotted path, `.`, or a `$`-prefixed identifier.
    pub name: String,
}

/// A slice of template source: literal text or a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece<'a> {
    /// Literal text between tags.
    Text(&'a str),
    /// A tag.
    Tag(Tag),
}

/// Split `source` into text and tags, in source order.
///
/// Anything that does not match the tag grammar is text.
pub fn scan(source: &str, grammar: Grammar) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in grammar.pattern().captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            pieces.push(Piece::Text(&source[last..whole.start()]));
        }
        pieces.push(Piece::Tag(Tag {
            kind: TagKind::from_sigil(&caps[1]),
            name: caps[2].to_string(),
        }));
        last = whole.end();
    }
    if last < source.len() {
        pieces.push(Piece::Text(&source[last..]));
    }
    pieces
}

/// How a variable expression is used in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Inside the literal: wrapped in `${ }`.
    Interpolated,
    /// As a plain JavaScript expression.
    Bare,
}

/// JavaScript expression for a tag name.
///
/// `.` is the current context, a `$`-prefixed name starts at that variable,
/// and everything else is a property path on the current context. Path
/// segments that are not identifiers use bracket access: `items.0` becomes
/// `$$.items[0]` and `my-var` becomes `$$["my-var"]`.
pub fn expression(name: &str, position: Position) -> String {
    let expr = if name == "." {
        "$$".to_string()
    } else {
        let (mut expr, path) = match name.strip_prefix('$') {
            Some(rest) => {
                let (head, path) = rest.split_once('.').unwrap_or((rest, ""));
                (format!("${head}"), path)
            }
            None => ("$$".to_string(), name),
        };
        if !path.is_empty() {
            path.split('.').for_each(|segment| push_member(&mut expr, segment));
        }
        expr
    };
    match position {
        Position::Bare => expr,
        Position::Interpolated => format!("${{{expr}}}"),
    }
}

/// Append property access for one path segment.
fn push_member(expr: &mut String, segment: &str) {
    let mut chars = segment.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        expr.push('.');
        expr.push_str(segment);
    } else if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        expr.push('[');
        expr.push_str(segment);
        expr.push(']');
    } else {
        expr.push_str("[\"");
        expr.push_str(segment);
        expr.push_str("\"]");
    }
}

/// Iteration order of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// `{{#name}}`: elements in order.
    Forward,
    /// `{{^name}}`: elements in reverse order.
    Reversed,
}

impl SectionKind {
    /// Client runtime helper that normalizes the bound value.
    fn helper(self) -> &'static str {
        match self {
            SectionKind::Forward => "arr",
            SectionKind::Reversed => "rearr",
        }
    }

    /// The contexts a section body is rendered with, for a bound value.
    ///
    /// `null` yields nothing, an array yields its elements, and any other
    /// value (including `false`) yields itself once. Reversed sections
    /// yield the same sequence backwards. This matches the `arr`/`rearr`
    /// helpers of the client runtime.
    pub fn iterate(self, value: &Value) -> Vec<&Value> {
        let mut items: Vec<&Value> = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        if self == SectionKind::Reversed {
            items.reverse();
        }
        items
    }
}

/// An open section awaiting its close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Iteration order.
    pub kind: SectionKind,
    /// Tag name, matched against the closing tag.
    pub name: String,
}

impl Section {
    /// Fragment emitted at the opening tag.
    pub fn open(&self) -> String {
        format!(
            "${{{}({}).map(($$,_i)=>{{return html`",
            self.kind.helper(),
            expression(&self.name, Position::Bare)
        )
    }

    /// Fragment emitted at the closing tag.
    pub fn close(&self) -> &'static str {
        "`})}"
    }
}

/// Failure to compile or render a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A closing tag with no open section.
    UnbalancedClose {
        /// Name on the closing tag.
        name: String,
    },
    /// A section still open at the end of the template.
    UnclosedSection {
        /// Name of the innermost open section.
        name: String,
    },
    /// A closing tag whose name differs from the innermost open section.
    MismatchedClose {
        /// Name of the innermost open section.
        expected: String,
        /// Name on the closing tag.
        found: String,
    },
    /// A partial reference, which is not supported.
    UnsupportedPartial {
        /// Name of the partial.
        name: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedClose { name } => {
                write!(f, "unbalanced section: {{{{/{name}}}}} closes nothing")
            }
            Self::UnclosedSection { name } => {
                write!(f, "unbalanced section: {{{{#{name}}}}} is never closed")
            }
            Self::MismatchedClose { expected, found } => {
                write!(f, "section {{{{#{expected}}}}} closed by {{{{/{found}}}}}")
            }
            Self::UnsupportedPartial { name } => write!(f, "partials are not supported: {name}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Explicit stack of open sections, shared by the compiler and the renderer.
#[derive(Debug)]
pub(crate) struct SectionStack<T> {
    frames: Vec<(Section, T)>,
}

impl<T> SectionStack<T> {
    pub(crate) fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub(crate) fn push(&mut self, section: Section, state: T) {
        self.frames.push((section, state));
    }

    /// Pop the innermost frame, which must be named `name`.
    pub(crate) fn pop(&mut self, name: &str) -> Result<(Section, T), CompileError> {
        match self.frames.pop() {
            None => Err(CompileError::UnbalancedClose {
                name: name.to_string(),
            }),
            Some((section, _)) if section.name != name => Err(CompileError::MismatchedClose {
                expected: section.name,
                found: name.to_string(),
            }),
            Some(frame) => Ok(frame),
        }
    }

    /// Fail if any frame is still open.
    pub(crate) fn finish(mut self) -> Result<(), CompileError> {
        match self.frames.pop() {
            Some((section, _)) => Err(CompileError::UnclosedSection { name: section.name }),
            None => Ok(()),
        }
    }
}

/// Escape what would otherwise end or interpolate inside a template literal.
fn escape_literal(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

/// Compile a template into the body of a JavaScript template literal.
///
/// Output is a pure function of the input.
pub fn compile(source: &str, grammar: Grammar) -> Result<String, CompileError> {
    trace_span!("compile", len = source.len());

    let escaped = escape_literal(source);
    let mut out = String::with_capacity(escaped.len());
    let mut stack = SectionStack::new();

    for piece in scan(&escaped, grammar) {
        let tag = match piece {
            Piece::Text(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Tag(tag) => tag,
        };
        trace!(sigil = tag.kind.sigil(), name = %tag.name, "tag");
        match tag.kind {
            TagKind::Variable => out.push_str(&expression(&tag.name, Position::Interpolated)),
            TagKind::SectionOpen | TagKind::SectionOpenReversed => {
                let kind = if tag.kind == TagKind::SectionOpen {
                    SectionKind::Forward
                } else {
                    SectionKind::Reversed
                };
                let section = Section {
                    kind,
                    name: tag.name,
                };
                out.push_str(&section.open());
                stack.push(section, ());
            }
            TagKind::SectionClose => {
                let (section, ()) = stack.pop(&tag.name)?;
                out.push_str(section.close());
            }
            TagKind::Comment => {}
            TagKind::PartialRef => {
                return Err(CompileError::UnsupportedPartial { name: tag.name });
            }
        }
    }

    stack.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variables() {
        assert_eq!(compile("{{foo.bar}}", Grammar::Mustache).unwrap(), "${$$.foo.bar}");
        assert_eq!(compile("{{.}}", Grammar::Mustache).unwrap(), "${$$}");
        assert_eq!(compile("{{$x}}", Grammar::Mustache).unwrap(), "${$x}");
    }

    #[test]
    fn index_and_dashed_segments_use_brackets() {
        assert_eq!(
            compile("<b>{{items.0}}</b>", Grammar::Mustache).unwrap(),
            "<b>${$$.items[0]}</b>"
        );
        assert_eq!(compile("{{my-var}}", Grammar::Mustache).unwrap(), "${$$[\"my-var\"]}");
        assert_eq!(
            expression("rows.12.first-name", Position::Bare),
            "$$.rows[12][\"first-name\"]"
        );
        assert_eq!(expression("$row.0", Position::Bare), "$row[0]");
        assert_eq!(expression("$.title", Position::Bare), "$.title");
        assert_eq!(
            compile("{{#grid.0}}{{.}}{{/grid.0}}", Grammar::Mustache).unwrap(),
            "${arr($$.grid[0]).map(($$,_i)=>{return html`${$$}`})}"
        );
    }

    #[test]
    fn bare_expressions() {
        assert_eq!(expression("a.b", Position::Bare), "$$.a.b");
        assert_eq!(expression(".", Position::Bare), "$$");
        assert_eq!(expression("$index", Position::Bare), "$index");
    }

    #[test]
    fn balanced_section() {
        assert_eq!(
            compile("{{#a}}body{{/a}}", Grammar::Mustache).unwrap(),
            "${arr($$.a).map(($$,_i)=>{return html`body`})}"
        );
    }

    #[test]
    fn reversed_section() {
        assert_eq!(
            compile("{{^a}}{{.}}{{/a}}", Grammar::Mustache).unwrap(),
            "${rearr($$.a).map(($$,_i)=>{return html`${$$}`})}"
        );
    }

    #[test]
    fn close_without_open() {
        assert_eq!(
            compile("{{/a}}", Grammar::Mustache),
            Err(CompileError::UnbalancedClose { name: "a".into() })
        );
    }

    #[test]
    fn open_without_close() {
        assert_eq!(
            compile("{{#a}}{{#b}}{{/b}}", Grammar::Mustache),
            Err(CompileError::UnclosedSection { name: "a".into() })
        );
    }

    #[test]
    fn mismatched_close() {
        assert_eq!(
            compile("{{#a}}{{/b}}", Grammar::Mustache),
            Err(CompileError::MismatchedClose {
                expected: "a".into(),
                found: "b".into()
            })
        );
    }

    #[test]
    fn comments_vanish_partials_fail() {
        assert_eq!(compile("a{{!note}}b", Grammar::Mustache).unwrap(), "ab");
        assert_eq!(
            compile("{{>header}}", Grammar::Mustache),
            Err(CompileError::UnsupportedPartial {
                name: "header".into()
            })
        );
    }

    #[test]
    fn literal_breakers_are_escaped() {
        assert_eq!(compile("a`b", Grammar::Mustache).unwrap(), "a\\`b");
        assert_eq!(compile("${x} \\n", Grammar::Mustache).unwrap(), "\\${x} \\\\n");
        assert_eq!(compile("${{name}}", Grammar::Mustache).unwrap(), "\\$${$$.name}");
    }

    #[test]
    fn guarded_grammar() {
        let source = "<ul><!--stache:#items--><li><!--stache:name--></li><!--stache:/items--></ul>";
        assert_eq!(
            compile(source, Grammar::Guarded).unwrap(),
            "<ul>${arr($$.items).map(($$,_i)=>{return html`<li>${$$.name}</li>`})}</ul>"
        );
    }

    #[test]
    fn grammars_do_not_cross() {
        assert_eq!(compile("{{name}}", Grammar::Guarded).unwrap(), "{{name}}");
        assert_eq!(
            compile("<!--stache:name-->", Grammar::Mustache).unwrap(),
            "<!--stache:name-->"
        );
    }

    #[test]
    fn deterministic() {
        let source = "{{#a}}{{#b}}{{x}}{{/b}}{{/a}}";
        assert_eq!(
            compile(source, Grammar::Mustache),
            compile(source, Grammar::Mustache)
        );
    }

    #[test]
    fn iteration_normalization() {
        assert!(SectionKind::Forward.iterate(&Value::Null).is_empty());
        assert_eq!(SectionKind::Forward.iterate(&json!(5)), vec![&json!(5)]);
        assert_eq!(SectionKind::Forward.iterate(&json!(false)), vec![&json!(false)]);
        assert_eq!(
            SectionKind::Forward.iterate(&json!([1, 2, 3])),
            vec![&json!(1), &json!(2), &json!(3)]
        );
        assert_eq!(
            SectionKind::Reversed.iterate(&json!([1, 2, 3])),
            vec![&json!(3), &json!(2), &json!(1)]
        );
    }
}

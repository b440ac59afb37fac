//! Server-side rendering of decoded pages against JSON data.
//!
//! Sections behave exactly like the compiled client templates (see
//! [`SectionKind::iterate`]), so a page rendered here and the same markup
//! hydrated in the browser agree.

use serde_json::Value;

use crate::compiler::{
    CompileError, Grammar, Piece, Section, SectionKind, SectionStack, TagKind, scan,
};
use crate::tracing_macros::trace_span;

#[derive(Debug)]
enum Block<'a> {
    Text(&'a str),
    Variable(String),
    Section(Section, Vec<Block<'a>>),
}

fn parse(source: &str, grammar: Grammar) -> Result<Vec<Block<'_>>, CompileError> {
    let mut stack: SectionStack<Vec<Block<'_>>> = SectionStack::new();
    let mut current = Vec::new();

    for piece in scan(source, grammar) {
        let tag = match piece {
            Piece::Text(text) => {
                current.push(Block::Text(text));
                continue;
            }
            Piece::Tag(tag) => tag,
        };
        match tag.kind {
            TagKind::Variable => current.push(Block::Variable(tag.name)),
            TagKind::SectionOpen | TagKind::SectionOpenReversed => {
                let kind = if tag.kind == TagKind::SectionOpen {
                    SectionKind::Forward
                } else {
                    SectionKind::Reversed
                };
                let outer = std::mem::take(&mut current);
                stack.push(
                    Section {
                        kind,
                        name: tag.name,
                    },
                    outer,
                );
            }
            TagKind::SectionClose => {
                let (section, outer) = stack.pop(&tag.name)?;
                let body = std::mem::replace(&mut current, outer);
                current.push(Block::Section(section, body));
            }
            TagKind::Comment => {}
            TagKind::PartialRef => {
                return Err(CompileError::UnsupportedPartial { name: tag.name });
            }
        }
    }

    stack.finish()?;
    Ok(current)
}

/// Resolve a tag name against the current context and the root data.
///
/// `.` is the context itself, `$` the root, `$.a.b` a path on the root.
/// Other `$` names are client-side helpers and resolve to nothing.
fn lookup<'v>(name: &str, context: &'v Value, root: &'v Value) -> Option<&'v Value> {
    if name == "." {
        return Some(context);
    }
    let (base, path) = match name.strip_prefix('$') {
        Some("") => return Some(root),
        Some(rest) => (root, rest.strip_prefix('.')?),
        None => (context, name),
    };
    path.split('.').try_fold(base, |value, key| match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Text a value interpolates to, as the client runtime would print it.
fn stringify(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        // Integral floats print without a fraction, as in JavaScript.
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.is_finite() => out.push_str(&f.to_string()),
            _ => out.push_str(&n.to_string()),
        },
        Value::Array(items) => items.iter().for_each(|item| stringify(item, out)),
        Value::Object(_) => out.push_str("[object Object]"),
    }
}

fn write_escaped(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

fn eval(blocks: &[Block<'_>], context: &Value, root: &Value, out: &mut String) {
    for block in blocks {
        match block {
            Block::Text(text) => out.push_str(text),
            Block::Variable(name) => {
                if let Some(value) = lookup(name, context, root) {
                    let mut text = String::new();
                    stringify(value, &mut text);
                    write_escaped(&text, out);
                }
            }
            Block::Section(section, body) => {
                let bound = lookup(&section.name, context, root).unwrap_or(&Value::Null);
                for item in section.kind.iterate(bound) {
                    eval(body, item, root, out);
                }
            }
        }
    }
}

/// Render a template with `data` as both the root and the initial context.
///
/// Interpolated values are HTML-escaped; missing values render empty.
pub fn render(source: &str, grammar: Grammar, data: &Value) -> Result<String, CompileError> {
    trace_span!("render", len = source.len());
    let blocks = parse(source, grammar)?;
    let mut out = String::with_capacity(source.len());
    eval(&blocks, data, data, &mut out);
    Ok(out)
}

//! Components and layouts, parsed once from their source files.

use std::sync::OnceLock;

use stache_html::{Document, Element, HtmlError, Node};

use crate::compiler::{CompileError, Grammar, compile};
use crate::guard;
use crate::tracing_macros::debug;

/// A custom element definition.
///
/// The source is an HTML fragment with an optional `<template>` and a
/// sibling `<script>`. Without a `<template>` the whole body is the
/// template and there is no script.
///
/// The client-side artifacts are derived lazily and computed at most once,
/// even when several threads ask for them at the same time.
#[derive(Debug)]
pub struct Component {
    name: String,
    fragment: Element,
    script: String,
    has_template: bool,
    client_template: OnceLock<Result<String, CompileError>>,
    module_definition: OnceLock<String>,
}

impl Component {
    /// Parse a component definition. `name` is the custom element tag name.
    ///
    /// Without a `<template>`, the fragment is the body of the normalized
    /// document. Head-type elements (`<style>`, `<meta>`, `<title>`,
    /// `<link>`, `<script>` ...) that come before any body content are moved
    /// to the head, as a browser would, and are not part of the fragment.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, HtmlError> {
        let name = name.into().to_ascii_lowercase();
        let document = Document::parse(&guard::encode(source))?;

        let (fragment, script, has_template) = match document.find("template") {
            Some(template) => {
                let script = [&document.head, &document.body]
                    .into_iter()
                    .find_map(|root| find_outside_templates(root, "script"))
                    .map(Element::text_content)
                    .unwrap_or_default();
                (template.clone(), script, true)
            }
            None => (document.body, String::new(), false),
        };

        debug!(%name, has_template, script_len = script.len(), "parsed component");

        Ok(Self {
            name,
            fragment,
            script,
            has_template,
            client_template: OnceLock::new(),
            module_definition: OnceLock::new(),
        })
    }

    /// The custom element tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The guard-encoded template: the `<template>` element, or `<body>`.
    ///
    /// Its children are the component's markup. Callers that rewrite it must
    /// clone it first.
    pub fn fragment(&self) -> &Element {
        &self.fragment
    }

    /// The behavior script, empty if there is none.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Whether the source had a `<template>` element.
    pub fn has_template(&self) -> bool {
        self.has_template
    }

    /// Statement registering the compiled client template under this name.
    pub fn client_template(&self) -> Result<&str, CompileError> {
        self.client_template
            .get_or_init(|| {
                let source = guard::decode(&self.fragment.inner_html());
                let body = compile(&source, Grammar::Mustache)?;
                Ok(format!(
                    "customComponents.setTemplate('{}',function($){{var $$=$;return html`{}`}});",
                    self.name, body
                ))
            })
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Statement defining the behavior module under this name.
    pub fn module_definition(&self) -> &str {
        self.module_definition.get_or_init(|| {
            format!(
                "customComponents.define('{}',(function(){{var module={{}};{};return module}})());",
                self.name, self.script
            )
        })
    }
}

/// First element named `name` that is not inside a `<template>`.
fn find_outside_templates<'a>(root: &'a Element, name: &str) -> Option<&'a Element> {
    root.children.iter().find_map(|node| match node {
        Node::Element(e) if e.name == "template" => None,
        Node::Element(e) if e.name.eq_ignore_ascii_case(name) => Some(e),
        Node::Element(e) => find_outside_templates(e, name),
        _ => None,
    })
}

/// A page layout: a whole document into whose outlets routes are rendered.
#[derive(Debug, Clone)]
pub struct Layout {
    document: Document,
    source: String,
}

impl Layout {
    /// Parse a layout document.
    pub fn parse(source: &str) -> Result<Self, HtmlError> {
        let source = guard::encode(source);
        let document = Document::parse(&source)?;
        Ok(Self { document, source })
    }

    /// The guard-encoded document. Never rewritten in place.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The guard-encoded source text.
    pub fn source(&self) -> &str {
        &self.source
    }
}

//! Expansion of custom elements into their component markup.
//!
//! Every element whose tag name is a registered component has its children
//! replaced by that component's assembled template. Expansion is bottom-up:
//! a component's own references and its own content sentinel are resolved
//! before its markup is placed into the caller. Then the caller's sentinel,
//! if any, receives the projected content.
//!
//! Stored component trees are never rewritten: every expansion works on a
//! clone.

use core::fmt;
use std::collections::BTreeMap;

use stache_html::{Element, HtmlError, Node};

use crate::component::Component;
use crate::guard;
use crate::tracing_macros::{trace, trace_span};

/// Lookup of components by tag name.
pub trait Components {
    /// The component registered for `name`, if any.
    fn component(&self, name: &str) -> Option<&Component>;
}

impl Components for BTreeMap<String, Component> {
    fn component(&self, name: &str) -> Option<&Component> {
        self.get(name)
    }
}

/// Failure to assemble a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    /// Markup produced during assembly failed to parse.
    Html(HtmlError),
    /// A component's template embeds itself, directly or transitively.
    Cycle {
        /// Component names from the outermost to the repeated one.
        chain: Vec<String>,
    },
}

impl From<HtmlError> for AssembleError {
    fn from(e: HtmlError) -> Self {
        Self::Html(e)
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html(e) => write!(f, "assembly produced unparsable markup: {e}"),
            Self::Cycle { chain } => write!(f, "component cycle: {}", chain.join(" -> ")),
        }
    }
}

impl std::error::Error for AssembleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Html(e) => Some(e),
            Self::Cycle { .. } => None,
        }
    }
}

/// Expand custom elements in `fragment`, then project `content` into its
/// sentinel.
///
/// Only the children of `fragment` are rewritten; the root itself is never
/// expanded.
pub fn assemble<C: Components + ?Sized>(
    components: &C,
    fragment: Element,
    content: &str,
) -> Result<Element, AssembleError> {
    Assembly::new(components).fragment(fragment, content)
}

/// Assemble a fresh copy of `component`'s template.
pub fn assemble_component<C: Components + ?Sized>(
    components: &C,
    component: &Component,
    content: &str,
) -> Result<Element, AssembleError> {
    let mut assembly = Assembly::new(components);
    assembly.chain.push(component.name().to_string());
    assembly.fragment(component.fragment().clone(), content)
}

struct Assembly<'a, C: ?Sized> {
    components: &'a C,
    /// Components currently being expanded, outermost first.
    chain: Vec<String>,
}

impl<'a, C: Components + ?Sized> Assembly<'a, C> {
    fn new(components: &'a C) -> Self {
        Self {
            components,
            chain: Vec::new(),
        }
    }

    fn fragment(&mut self, mut fragment: Element, content: &str) -> Result<Element, AssembleError> {
        trace_span!("assemble", root = %fragment.name, depth = self.chain.len());
        self.expand(&mut fragment)?;

        let markup = fragment.inner_html();
        if guard::has_content_sentinel(&markup) {
            let filled = guard::fill_content(&markup, content);
            fragment.set_inner_html(&filled)?;
        }
        Ok(fragment)
    }

    fn expand(&mut self, parent: &mut Element) -> Result<(), AssembleError> {
        let components = self.components;
        for node in parent.children.iter_mut() {
            let Node::Element(elem) = node else { continue };
            let Some(component) = components.component(&elem.name) else {
                self.expand(elem)?;
                continue;
            };

            if self.chain.iter().any(|name| name == component.name()) {
                let mut chain = self.chain.clone();
                chain.push(component.name().to_string());
                return Err(AssembleError::Cycle { chain });
            }

            trace!(component = component.name(), "expanding");
            self.chain.push(component.name().to_string());
            let assembled = self.fragment(component.fragment().clone(), "")?;
            self.chain.pop();
            elem.children = assembled.children;
        }
        Ok(())
    }
}

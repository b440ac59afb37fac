//! The component and layout store, route rendering and the client bundle.

use core::fmt;
use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use stache_html::{Element, HtmlError, Selector};

use crate::assemble::{AssembleError, Components, assemble, assemble_component};
use crate::compiler::{CompileError, Grammar};
use crate::component::{Component, Layout};
use crate::options::RenderOptions;
use crate::tracing_macros::{debug, trace_span};
use crate::{guard, render};

/// Client runtime prepended to the bundle. Leaves a function scope open.
pub const CLIENT_RUNTIME: &str = include_str!("runtime.js");

/// Closes the scope opened by [`CLIENT_RUNTIME`].
const CLIENT_RUNTIME_END: &str = "})();";

/// One route served at a path.
///
/// A path can be served by several routes (a parent and its child, each
/// filling its own outlet). Routes sharing an `id` are rendered once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Identity used to skip repeated entries.
    pub id: usize,
    /// Component rendered into the outlet.
    pub component: String,
    /// Outlet selector; empty means the configured default.
    pub outlet: String,
    /// Layout name; only read from the first route, empty means the default.
    pub layout: String,
}

impl Route {
    /// A route rendering `component` into the default outlet.
    pub fn new(id: usize, component: impl Into<String>) -> Self {
        Self {
            id,
            component: component.into(),
            outlet: String::new(),
            layout: String::new(),
        }
    }

    /// Render into `outlet` instead of the default outlet.
    pub fn with_outlet(mut self, outlet: impl Into<String>) -> Self {
        self.outlet = outlet.into();
        self
    }

    /// Use `layout` instead of the default layout.
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }
}

/// What kind of entry a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A component.
    Component,
    /// A layout.
    Layout,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Component => f.write_str("component"),
            EntryKind::Layout => f.write_str("layout"),
        }
    }
}

/// Failure to build the store or render from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagesError {
    /// A name was registered twice.
    DuplicateName {
        /// Which table the name collided in.
        kind: EntryKind,
        /// The name.
        name: String,
    },
    /// A route refers to a component that is not registered.
    UndefinedComponent {
        /// The component name.
        name: String,
    },
    /// A route refers to a layout that is not registered.
    UndefinedLayout {
        /// The layout name.
        name: String,
    },
    /// The layout has no element matching a route's outlet.
    MissingOutlet {
        /// The outlet selector.
        outlet: String,
        /// The component that was to be placed there.
        component: String,
    },
    /// Source markup failed to parse.
    Html(HtmlError),
    /// Component expansion failed.
    Assemble(AssembleError),
    /// A template failed to compile or render.
    Compile(CompileError),
}

impl From<HtmlError> for PagesError {
    fn from(e: HtmlError) -> Self {
        Self::Html(e)
    }
}

impl From<AssembleError> for PagesError {
    fn from(e: AssembleError) -> Self {
        Self::Assemble(e)
    }
}

impl From<CompileError> for PagesError {
    fn from(e: CompileError) -> Self {
        Self::Compile(e)
    }
}

impl fmt::Display for PagesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { kind, name } => write!(f, "{kind} {name} is already defined"),
            Self::UndefinedComponent { name } => {
                write!(f, "trying to access undefined component {name}")
            }
            Self::UndefinedLayout { name } => write!(f, "trying to access undefined layout {name}"),
            Self::MissingOutlet { outlet, component } => {
                write!(f, "can't find router outlet {outlet} for component {component}")
            }
            Self::Html(e) => write!(f, "{e}"),
            Self::Assemble(e) => write!(f, "{e}"),
            Self::Compile(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PagesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Html(e) => Some(e),
            Self::Assemble(e) => Some(e),
            Self::Compile(e) => Some(e),
            _ => None,
        }
    }
}

/// Components and layouts, built once and then only read.
///
/// Every render clones the stored trees it rewrites, so a shared `&Pages`
/// can serve any number of concurrent renders.
#[derive(Debug, Default)]
pub struct Pages {
    options: RenderOptions,
    components: BTreeMap<String, Component>,
    layouts: BTreeMap<String, Layout>,
}

impl Pages {
    /// An empty store.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            components: BTreeMap::new(),
            layouts: BTreeMap::new(),
        }
    }

    /// The options this store renders with.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Parse and register a component under `name` (lower-cased).
    pub fn add_component(&mut self, name: &str, source: &str) -> Result<&Component, PagesError> {
        let name = name.to_ascii_lowercase();
        if self.components.contains_key(&name) {
            return Err(PagesError::DuplicateName {
                kind: EntryKind::Component,
                name,
            });
        }
        let component = Component::parse(name.clone(), source)?;
        Ok(self.components.entry(name).or_insert(component))
    }

    /// Parse and register a layout under `name`.
    pub fn add_layout(&mut self, name: &str, source: &str) -> Result<&Layout, PagesError> {
        if self.layouts.contains_key(name) {
            return Err(PagesError::DuplicateName {
                kind: EntryKind::Layout,
                name: name.to_string(),
            });
        }
        let layout = Layout::parse(source)?;
        Ok(self.layouts.entry(name.to_string()).or_insert(layout))
    }

    /// The component registered as `name`.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(&name.to_ascii_lowercase())
    }

    /// The layout registered as `name`.
    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts.get(name)
    }

    /// All components, ordered by name.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Render the layout with each route's component in its outlet.
    ///
    /// The result is guard-encoded markup for the whole document. Nothing is
    /// returned unless every route renders.
    pub fn render_route(&self, routes: &[Route]) -> Result<String, PagesError> {
        trace_span!("render_route", routes = routes.len());

        let layout_name = routes
            .first()
            .map(|r| r.layout.as_str())
            .filter(|l| !l.is_empty())
            .unwrap_or(&*self.options.default_layout);
        let layout = self
            .layouts
            .get(layout_name)
            .ok_or_else(|| PagesError::UndefinedLayout {
                name: layout_name.to_string(),
            })?;

        let mut body = assemble(&self.components, layout.document().body.clone(), "")?;

        let mut done = HashSet::new();
        for route in routes {
            if !done.insert(route.id) {
                continue;
            }

            let outlet = if route.outlet.is_empty() {
                &*self.options.default_outlet
            } else {
                route.outlet.as_str()
            };

            let component =
                self.component(&route.component)
                    .ok_or_else(|| PagesError::UndefinedComponent {
                        name: route.component.clone(),
                    })?;

            let assembled = assemble_component(&self.components, component, "")?;
            let name = component.name();
            let markup = format!("<{name}>{}</{name}>", assembled.inner_html());

            let placed = body.select_mut(&Selector::parse(outlet), &mut |target: &mut Element| {
                target.set_inner_html(&markup)
            })?;
            if placed == 0 {
                return Err(PagesError::MissingOutlet {
                    outlet: outlet.to_string(),
                    component: name.to_string(),
                });
            }
            debug!(component = name, outlet, placed, "placed route component");
        }

        let mut document = layout.document().clone();
        document.body = body;
        Ok(document.to_html())
    }

    /// [`Pages::render_route`] with guard comments turned back into tags:
    /// plain mustache source for a server-side renderer.
    pub fn page_source(&self, routes: &[Route]) -> Result<String, PagesError> {
        Ok(guard::decode(&self.render_route(routes)?))
    }

    /// Render the page for `routes` with `data`.
    pub fn render_page(&self, routes: &[Route], data: &Value) -> Result<String, PagesError> {
        let source = self.page_source(routes)?;
        Ok(render::render(&source, Grammar::Mustache, data)?)
    }

    /// The client script: runtime, then every component's template and
    /// module definition in name order.
    pub fn client_bundle(&self) -> Result<String, PagesError> {
        let mut out = String::from(CLIENT_RUNTIME);
        for component in self.components.values() {
            out.push_str(component.client_template()?);
            out.push_str(component.module_definition());
        }
        out.push_str(CLIENT_RUNTIME_END);
        Ok(out)
    }
}

impl Components for Pages {
    fn component(&self, name: &str) -> Option<&Component> {
        Pages::component(self, name)
    }
}

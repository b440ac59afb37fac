//! Rendering configuration.

use std::borrow::Cow;

/// Options for route rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Outlet selector used when a route names none (default: `router-outlet`).
    pub default_outlet: Cow<'static, str>,
    /// Layout used when the first route names none (default: `index`).
    pub default_layout: Cow<'static, str>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            default_outlet: Cow::Borrowed("router-outlet"),
            default_layout: Cow::Borrowed("index"),
        }
    }
}

impl RenderOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the outlet selector for routes that name none.
    pub fn default_outlet(mut self, outlet: impl Into<Cow<'static, str>>) -> Self {
        self.default_outlet = outlet.into();
        self
    }

    /// Set the layout for route lists whose first route names none.
    pub fn default_layout(mut self, layout: impl Into<Cow<'static, str>>) -> Self {
        self.default_layout = layout.into();
        self
    }
}

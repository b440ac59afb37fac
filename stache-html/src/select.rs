//! Minimal selectors for locating outlet elements.

use crate::node::{Element, Node};

/// An element selector: `#id` or a bare tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Matches elements whose `id` attribute equals the value.
    Id(String),
    /// Matches elements by tag name, case-insensitively.
    Tag(String),
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(selector: &str) -> Self {
        let selector = selector.trim();
        match selector.strip_prefix('#') {
            Some(id) => Selector::Id(id.to_string()),
            None => Selector::Tag(selector.to_ascii_lowercase()),
        }
    }

    /// Whether `elem` matches this selector.
    pub fn matches(&self, elem: &Element) -> bool {
        match self {
            Selector::Id(id) => elem.attr("id") == Some(id.as_str()),
            Selector::Tag(name) => elem.name.eq_ignore_ascii_case(name),
        }
    }
}

impl Element {
    /// Call `f` on every descendant matching `selector`, in pre-order.
    ///
    /// A matched element's own children are not searched; `f` is free to
    /// replace them. Returns how many elements matched. Stops at the first
    /// error returned by `f`.
    pub fn select_mut<E>(
        &mut self,
        selector: &Selector,
        f: &mut impl FnMut(&mut Element) -> Result<(), E>,
    ) -> Result<usize, E> {
        let mut count = 0;
        for child in self.children.iter_mut() {
            if let Node::Element(e) = child {
                if selector.matches(e) {
                    f(e)?;
                    count += 1;
                } else {
                    count += e.select_mut(selector, &mut *f)?;
                }
            }
        }
        Ok(count)
    }
}

//! Component overrides applied by the runtime.

use crate::tree::{Element, Node};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Replaces one element at render time.
///
/// The element arrives with its children already rendered, so a component
/// only decides about its own tag.
pub trait Component: Send + Sync {
    /// Produces the node that stands in for `element`.
    fn render(&self, element: Element) -> Node;
}

impl<F> Component for F
where
    F: Fn(Element) -> Node + Send + Sync,
{
    fn render(&self, element: Element) -> Node {
        (self)(element)
    }
}

/// Map from tag name to the component overriding it.
///
/// Cheap to clone; components are shared.
#[derive(Clone, Default)]
pub struct ComponentTable {
    components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentTable {
    /// A table with no overrides: elements render as themselves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ComponentTable::insert`].
    pub fn with(mut self, tag: impl Into<String>, component: impl Component + 'static) -> Self {
        self.insert(tag, component);
        self
    }

    /// Registers `component` for `tag`, replacing any previous override.
    pub fn insert(&mut self, tag: impl Into<String>, component: impl Component + 'static) {
        self.components.insert(tag.into(), Arc::new(component));
    }

    /// Overlays `other` on this table; entries in `other` win.
    pub fn extend(&mut self, other: &ComponentTable) {
        for (tag, component) in &other.components {
            self.components.insert(tag.clone(), Arc::clone(component));
        }
    }

    /// Looks up the override for `tag`.
    pub fn get(&self, tag: &str) -> Option<&dyn Component> {
        self.components.get(tag).map(|component| component.as_ref())
    }

    /// Whether `tag` has an override.
    pub fn contains(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the table has no overrides.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for ComponentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.components.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("ComponentTable").field("tags", &tags).finish()
    }
}

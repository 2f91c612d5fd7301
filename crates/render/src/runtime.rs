//! View-time execution of compiled bodies.
//!
//! Rendering is a pure function of the compiled body and the component
//! table; nothing is cached between calls.

use crate::compile::{CompiledBody, FORMAT_VERSION};
use crate::registry::ComponentTable;
use crate::tree::{self, Node};
use thiserror::Error;

/// Why a compiled body could not be rendered.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The body was produced by an incompatible compiler.
    #[error("compiled body version {found} is not supported (expected {expected})")]
    Version {
        /// Version found in the body.
        found: u32,
        /// Version this runtime executes.
        expected: u32,
    },
    /// The serialized body could not be read.
    #[error("invalid compiled body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// The rendered tree.
    pub nodes: Vec<Node>,
}

impl Rendered {
    /// Serializes to HTML.
    pub fn to_html(&self) -> String {
        tree::to_html(&self.nodes)
    }

    /// Visible text, without markup.
    pub fn text_content(&self) -> String {
        tree::text_content(&self.nodes)
    }
}

/// Executes compiled bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct Runtime;

impl Runtime {
    /// Renders `body`, passing every element with an override (children
    /// first) through its component.
    pub fn render(body: &CompiledBody, components: &ComponentTable) -> Result<Rendered, RenderError> {
        if body.version != FORMAT_VERSION {
            return Err(RenderError::Version {
                found: body.version,
                expected: FORMAT_VERSION,
            });
        }
        let nodes = render_nodes(body.children.clone(), components);
        Ok(Rendered { nodes })
    }

    /// Renders a body read from its JSON form.
    pub fn render_json(json: &str, components: &ComponentTable) -> Result<Rendered, RenderError> {
        let body: CompiledBody = serde_json::from_str(json)?;
        Self::render(&body, components)
    }
}

fn render_nodes(nodes: Vec<Node>, components: &ComponentTable) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| render_node(node, components))
        .collect()
}

fn render_node(node: Node, components: &ComponentTable) -> Node {
    let Node::Element(mut el) = node else {
        return node;
    };
    el.children = render_nodes(std::mem::take(&mut el.children), components);
    match components.get(&el.tag) {
        Some(component) => component.render(el),
        None => Node::Element(el),
    }
}

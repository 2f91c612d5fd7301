//! Tree-level transform passes and their composition.
//!
//! - `heading_ids`: unique `id` per heading, table of contents.
//! - `autolink`: wraps heading content in a self-link.
//! - `diagram`: renders diagram code blocks to SVG or marks them for the client.
//! - `highlight`: syntax highlighting with light/dark colors and a copy button.
//! - `svg`: clean-up applied to rendered diagram SVG.
//!
//! Passes are composed by explicit ordered registration in a
//! [`TransformChain`]. Each pass must be idempotent on its own output.

pub mod autolink;
pub mod diagram;
pub mod heading_ids;
pub mod highlight;
pub mod svg;

use crate::tree::Node;
use inkpress_core::Diagnostics;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use autolink::AutolinkHeadings;
pub use diagram::{DiagramError, DiagramPolicy, DiagramRenderer, DiagramStrategy, Diagrams, MermaidCli};
pub use heading_ids::HeadingIds;
pub use highlight::{Highlight, HighlightThemes};

/// Heading metadata extracted while assigning ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    /// Heading depth (1-6).
    pub depth: u8,
    /// Anchor id.
    pub slug: String,
    /// Visible heading text.
    pub text: String,
}

/// Per-document state shared by the passes of one chain run.
#[derive(Debug, Default)]
pub struct PassContext {
    /// Table of contents, filled by [`HeadingIds`].
    pub headings: Vec<HeadingEntry>,
    /// Non-fatal warnings.
    pub diagnostics: Diagnostics,
}

/// Fatal transform failures.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A diagram failed to render under the `fatal` policy.
    #[error("{language} diagram failed to render: {message}")]
    Diagram {
        /// Diagram language.
        language: String,
        /// Renderer failure.
        message: String,
    },
    /// The highlighter choked on a code block.
    #[error("highlighting {language} failed: {message}")]
    Highlight {
        /// Code block language.
        language: String,
        /// Underlying error.
        message: String,
    },
}

/// A pure tree-to-tree pass.
pub trait TreePass: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Rewrites `nodes` in place.
    fn transform(&self, nodes: &mut Vec<Node>, ctx: &mut PassContext) -> Result<(), TransformError>;
}

/// Ordered list of passes.
#[derive(Default)]
pub struct TransformChain {
    passes: Vec<Box<dyn TreePass>>,
}

impl TransformChain {
    /// An empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pass; passes run in registration order.
    pub fn with_pass(mut self, pass: impl TreePass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Names of the registered passes, in order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Runs every pass over `nodes`.
    pub fn run(&self, nodes: &mut Vec<Node>, ctx: &mut PassContext) -> Result<(), TransformError> {
        for pass in &self.passes {
            log::trace!("running pass {}", pass.name());
            pass.transform(nodes, ctx)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.pass_names()).finish()
    }
}

/// Whether `el` is the generated footnote section; heading passes leave it alone.
pub(crate) fn is_footnote_section(el: &crate::tree::Element) -> bool {
    el.tag == "section" && el.props.contains_key("data-footnotes")
}

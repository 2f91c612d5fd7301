//! Lowering from mdast to the render tree.
//!
//! Produces plain GFM-shaped markup (`p`, `h2`, `pre > code.language-x`,
//! task lists, footnote sections) that the transform passes then refine.

mod context;
mod nodes;

use crate::tree::Node;
use inkpress_core::ContentError;
use context::Context;
use markdown::mdast;

/// Options for [`lower`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LowerOptions {
    /// Keep raw HTML nodes as raw markup instead of escaping them as text.
    pub allow_raw_html: bool,
}

/// Lowers a parsed document into render-tree nodes.
///
/// MDX expressions (other than comments) and ESM statements have no
/// declarative form and fail with [`ContentError::Unsupported`].
pub fn lower(root: &mdast::Node, options: &LowerOptions) -> Result<Vec<Node>, ContentError> {
    let mut ctx = Context::new(options, root);
    let mut out = Vec::new();
    nodes::lower_node(root, &mut ctx, &mut out)?;
    ctx.finish(&mut out)?;
    Ok(out)
}

//! Assigns github-slugger compatible ids to headings.

use super::{HeadingEntry, PassContext, TransformError, TreePass, is_footnote_section};
use crate::tree::{Element, Node, visit_elements};
use inkpress_core::slug::{Slugger, extract_custom_id};

/// Gives every heading a unique `id` and records the table of contents.
///
/// A trailing `{#custom-id}` in the heading text becomes the id and is
/// removed from the text. Headings that already carry an id keep it.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadingIds;

impl TreePass for HeadingIds {
    fn name(&self) -> &'static str {
        "heading-ids"
    }

    fn transform(&self, nodes: &mut Vec<Node>, ctx: &mut PassContext) -> Result<(), TransformError> {
        let mut slugger = Slugger::new();
        visit_elements(nodes, &mut |el| {
            if el.heading_depth().is_some()
                && let Some(id) = el.prop("id")
            {
                slugger.reserve(id);
            }
        });

        let mut headings = Vec::new();
        assign(nodes, &mut slugger, &mut headings);
        ctx.headings = headings;
        Ok(())
    }
}

fn assign(nodes: &mut [Node], slugger: &mut Slugger, out: &mut Vec<HeadingEntry>) {
    for node in nodes {
        let Node::Element(el) = node else {
            continue;
        };
        if is_footnote_section(el) || el.tag == "pre" {
            continue;
        }
        let Some(depth) = el.heading_depth() else {
            assign(&mut el.children, slugger, out);
            continue;
        };

        let id = match el.prop("id") {
            Some(id) => id.to_string(),
            None => match strip_custom_id(&mut el.children) {
                Some(custom) => {
                    slugger.reserve(&custom);
                    custom
                }
                None => slugger.next_slug(el.text_content().trim()),
            },
        };
        el.set_prop("id", id.clone());
        out.push(HeadingEntry {
            depth,
            slug: id,
            text: collapsed_text(el),
        });
    }
}

/// Removes `{#id}` from the last text of a heading, looking through inline
/// wrappers but not into code.
fn strip_custom_id(children: &mut [Node]) -> Option<String> {
    match children.last_mut()? {
        Node::Text { value } => {
            let (text, id) = extract_custom_id(value);
            let id = id?.to_string();
            *value = text.to_string();
            Some(id)
        }
        Node::Element(el) if matches!(el.tag.as_str(), "strong" | "em" | "del" | "a") => {
            strip_custom_id(&mut el.children)
        }
        _ => None,
    }
}

fn collapsed_text(el: &Element) -> String {
    el.text_content()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

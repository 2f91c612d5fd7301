//! Heading self-links.

use super::{PassContext, TransformError, TreePass, is_footnote_section};
use crate::tree::{Element, Node};

/// Class put on the generated anchor.
pub const ANCHOR_CLASS: &str = "heading-anchor";

/// Wraps the content of every heading with an id in
/// `<a class="heading-anchor" href="#id">`.
///
/// Headings that already contain a link are left alone so anchors never
/// nest. Runs after [`super::HeadingIds`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AutolinkHeadings;

impl TreePass for AutolinkHeadings {
    fn name(&self) -> &'static str {
        "autolink-headings"
    }

    fn transform(&self, nodes: &mut Vec<Node>, _ctx: &mut PassContext) -> Result<(), TransformError> {
        wrap_headings(nodes);
        Ok(())
    }
}

fn wrap_headings(nodes: &mut [Node]) {
    for node in nodes {
        let Node::Element(el) = node else {
            continue;
        };
        if is_footnote_section(el) || el.tag == "pre" {
            continue;
        }
        if el.heading_depth().is_none() {
            wrap_headings(&mut el.children);
            continue;
        }
        let Some(id) = el.prop("id").map(str::to_string) else {
            continue;
        };
        if contains_link(&el.children) {
            continue;
        }
        let children = std::mem::take(&mut el.children);
        el.children.push(
            Element::new("a")
                .with_prop("class", ANCHOR_CLASS)
                .with_prop("href", format!("#{id}"))
                .with_children(children)
                .into(),
        );
    }
}

fn contains_link(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Element(el) => el.tag == "a" || contains_link(&el.children),
        Node::Raw { html } => {
            let lower = html.to_ascii_lowercase();
            lower.contains("<a ") || lower.contains("<a>")
        }
        Node::Text { .. } => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::to_html;

    fn run(nodes: &mut Vec<Node>) {
        AutolinkHeadings
            .transform(nodes, &mut PassContext::default())
            .unwrap();
    }

    #[test]
    fn wraps_heading_content() {
        let mut nodes = vec![
            Element::new("h2")
                .with_prop("id", "why-rust")
                .with_child(Node::text("Why "))
                .with_child(Element::new("em").with_child(Node::text("Rust")))
                .into(),
        ];
        run(&mut nodes);
        assert_eq!(
            to_html(&nodes),
            "<h2 id=\"why-rust\"><a class=\"heading-anchor\" href=\"#why-rust\">Why <em>Rust</em></a></h2>"
        );
        let once = nodes.clone();
        run(&mut nodes);
        assert_eq!(nodes, once);
    }

    #[test]
    fn skips_headings_with_links_or_without_ids() {
        let mut nodes = vec![
            Element::new("h2")
                .with_prop("id", "docs")
                .with_child(Element::new("a").with_prop("href", "/docs"))
                .into(),
            Element::new("h3").with_child(Node::text("No id")).into(),
        ];
        let before = nodes.clone();
        run(&mut nodes);
        assert_eq!(nodes, before);
    }
}

//! The render tree: the declarative unit that passes transform, the compiler
//! serializes and the runtime executes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of a render tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// A tag with props and children.
    Element(Element),
    /// Text, escaped on output.
    Text {
        /// The text content.
        value: String,
    },
    /// Markup emitted verbatim (build-time SVG, opted-in raw HTML).
    Raw {
        /// The markup.
        html: String,
    },
}

impl Node {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    /// Creates a raw markup node.
    pub fn raw(html: impl Into<String>) -> Self {
        Node::Raw { html: html.into() }
    }

    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable variant of [`Node::as_element`].
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An element: tag name, string props, children.
///
/// Props are kept sorted so serialized trees are stable across builds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    /// Tag name (`p`, `h2`, or a component name from MDX such as `Callout`).
    pub tag: String,
    /// Attributes; an empty value renders as a boolean attribute.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, String>,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no props or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Builder-style prop setter.
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Builder-style children setter.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Builder-style single child append.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Looks up a prop.
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(String::as_str)
    }

    /// Sets a prop, replacing any previous value.
    pub fn set_prop(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.props.insert(name.into(), value.into());
    }

    /// Whether the space separated `class` prop contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.prop("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Appends classes to the `class` prop, skipping ones already present.
    pub fn add_class(&mut self, classes: &str) {
        for class in classes.split_whitespace() {
            if self.has_class(class) {
                continue;
            }
            let entry = self.props.entry("class".to_string()).or_default();
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(class);
        }
    }

    /// Whether this is `h1`..`h6`.
    pub fn heading_depth(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        text_content(&self.children)
    }

    /// The language named by a `language-*` class, if any.
    pub fn language(&self) -> Option<&str> {
        self.prop("class")?
            .split_whitespace()
            .find_map(|class| class.strip_prefix("language-"))
            .filter(|lang| !lang.is_empty())
    }
}

/// Concatenated text of `nodes`; raw markup contributes nothing.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    push_text(nodes, &mut out);
    out
}

fn push_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { value } => out.push_str(value),
            Node::Element(el) => push_text(&el.children, out),
            Node::Raw { .. } => {}
        }
    }
}

/// Visits every element in document order, parents before children.
pub fn visit_elements_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            visit_elements_mut(&mut el.children, f);
        }
    }
}

/// Visits every element in document order.
pub fn visit_elements<'a>(nodes: &'a [Node], f: &mut dyn FnMut(&'a Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            visit_elements(&el.children, f);
        }
    }
}

const VOID_TAGS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "source", "wbr"];

/// Serializes nodes to HTML. Text and attribute values are escaped; raw
/// nodes are written as-is.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::with_capacity(1024);
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { value } => out.push_str(&html_escape::encode_text(value)),
            Node::Raw { html } => out.push_str(html),
            Node::Element(el) => write_element(el, out),
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.props {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
    }
    if VOID_TAGS.contains(&el.tag.as_str()) && el.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    write_nodes(&el.children, out);
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_output_escapes_text_and_attributes() {
        let nodes = vec![
            Element::new("p")
                .with_prop("title", "a \"quote\"")
                .with_child(Node::text("1 < 2 & <b>"))
                .into(),
            Element::new("input")
                .with_prop("type", "checkbox")
                .with_prop("disabled", "")
                .into(),
            Node::raw("<svg></svg>"),
        ];
        assert_eq!(
            to_html(&nodes),
            "<p title=\"a &quot;quote&quot;\">1 &lt; 2 &amp; &lt;b&gt;</p><input disabled type=\"checkbox\" /><svg></svg>"
        );
    }

    #[test]
    fn class_helpers() {
        let mut el = Element::new("code").with_prop("class", "language-rust");
        assert_eq!(el.language(), Some("rust"));
        el.add_class("a language-rust b");
        assert_eq!(el.prop("class"), Some("language-rust a b"));
        assert!(el.has_class("b"));
        assert!(!el.has_class("lang"));
    }

    #[test]
    fn serialized_shape() {
        let node: Node = Element::new("h1")
            .with_prop("id", "hi")
            .with_child(Node::text("Hi"))
            .into();
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "element",
                "tag": "h1",
                "props": { "id": "hi" },
                "children": [{ "type": "text", "value": "Hi" }]
            })
        );
        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn text_content_skips_raw() {
        let el = Element::new("div")
            .with_child(Node::text("a"))
            .with_child(Node::raw("<b>x</b>"))
            .with_child(Element::new("span").with_child(Node::text("b")));
        assert_eq!(el.text_content(), "ab");
    }
}

//! State carried through one lowering run: reference definitions, footnote
//! numbering and the options.

use super::LowerOptions;
use super::nodes::lower_node;
use crate::tree::{Element, Node};
use inkpress_core::ContentError;
use markdown::mdast;
use std::collections::HashMap;

/// A link or image definition (`[id]: url "title"`).
#[derive(Debug, Clone)]
pub(super) struct Definition {
    pub url: String,
    pub title: Option<String>,
}

/// Lowering state for one document.
pub struct Context<'a> {
    options: &'a LowerOptions,
    definitions: HashMap<String, Definition>,
    footnote_defs: HashMap<String, &'a mdast::FootnoteDefinition>,
    /// Footnote identifiers in order of first reference.
    footnote_order: Vec<String>,
    footnote_refs: HashMap<String, usize>,
}

impl<'a> Context<'a> {
    /// Collects definitions from `root` up front so references may precede them.
    pub fn new(options: &'a LowerOptions, root: &'a mdast::Node) -> Self {
        let mut ctx = Self {
            options,
            definitions: HashMap::new(),
            footnote_defs: HashMap::new(),
            footnote_order: Vec::new(),
            footnote_refs: HashMap::new(),
        };
        ctx.collect_definitions(root);
        ctx
    }

    fn collect_definitions(&mut self, node: &'a mdast::Node) {
        match node {
            mdast::Node::Definition(def) => {
                // First definition wins, as in CommonMark.
                self.definitions
                    .entry(normalize_identifier(&def.identifier))
                    .or_insert_with(|| Definition {
                        url: def.url.clone(),
                        title: def.title.clone(),
                    });
            }
            mdast::Node::FootnoteDefinition(def) => {
                self.footnote_defs
                    .entry(normalize_identifier(&def.identifier))
                    .or_insert(def);
            }
            _ => {
                if let Some(children) = node.children() {
                    for child in children {
                        self.collect_definitions(child);
                    }
                }
            }
        }
    }

    pub(super) fn raw_html_allowed(&self) -> bool {
        self.options.allow_raw_html
    }

    pub(super) fn definition(&self, identifier: &str) -> Option<&Definition> {
        self.definitions.get(&normalize_identifier(identifier))
    }

    /// Registers a footnote reference; returns `(safe id, ordinal, nth reference)`.
    ///
    /// `None` when no definition exists for the identifier.
    pub(super) fn footnote_reference(&mut self, identifier: &str) -> Option<(String, usize, usize)> {
        let key = normalize_identifier(identifier);
        if !self.footnote_defs.contains_key(&key) {
            return None;
        }
        let ordinal = match self.footnote_order.iter().position(|id| *id == key) {
            Some(idx) => idx + 1,
            None => {
                self.footnote_order.push(key.clone());
                self.footnote_order.len()
            }
        };
        let count = self.footnote_refs.entry(key.clone()).or_insert(0);
        *count += 1;
        Some((safe_id(&key), ordinal, *count))
    }

    /// Appends the footnote section for every referenced definition.
    pub(super) fn finish(&mut self, out: &mut Vec<Node>) -> Result<(), ContentError> {
        if self.footnote_order.is_empty() {
            return Ok(());
        }

        let mut items = Vec::new();
        // Definitions may reference further footnotes, growing the order.
        let mut idx = 0;
        while idx < self.footnote_order.len() {
            let key = self.footnote_order[idx].clone();
            idx += 1;
            let Some(def) = self.footnote_defs.get(&key).copied() else {
                continue;
            };
            let mut content = Vec::new();
            for child in &def.children {
                lower_node(child, self, &mut content)?;
            }
            let id = safe_id(&key);
            let refs = self.footnote_refs.get(&key).copied().unwrap_or(1);
            let backrefs = backref_links(&id, idx, refs);
            match content.last_mut().and_then(Node::as_element_mut) {
                Some(last) if last.tag == "p" => {
                    for backref in backrefs {
                        last.children.push(Node::text(" "));
                        last.children.push(backref);
                    }
                }
                _ => content.extend(backrefs),
            }
            items.push(
                Element::new("li")
                    .with_prop("id", format!("user-content-fn-{id}"))
                    .with_children(content)
                    .into(),
            );
        }

        let heading = Element::new("h2")
            .with_prop("class", "sr-only")
            .with_prop("id", "footnote-label")
            .with_child(Node::text("Footnotes"));
        out.push(
            Element::new("section")
                .with_prop("data-footnotes", "")
                .with_prop("class", "footnotes")
                .with_child(heading)
                .with_child(Element::new("ol").with_children(items))
                .into(),
        );
        Ok(())
    }
}

fn backref_links(id: &str, ordinal: usize, refs: usize) -> Vec<Node> {
    (1..=refs)
        .map(|nth| {
            let suffix = if nth == 1 { String::new() } else { format!("-{nth}") };
            let mut link = Element::new("a")
                .with_prop("href", format!("#user-content-fnref-{id}{suffix}"))
                .with_prop("data-footnote-backref", "")
                .with_prop("class", "data-footnote-backref")
                .with_prop(
                    "aria-label",
                    if nth == 1 {
                        format!("Back to reference {ordinal}")
                    } else {
                        format!("Back to reference {ordinal}-{nth}")
                    },
                )
                .with_child(Node::text("↩"));
            if nth > 1 {
                link.children
                    .push(Element::new("sup").with_child(Node::text(nth.to_string())).into());
            }
            link.into()
        })
        .collect()
}

fn normalize_identifier(identifier: &str) -> String {
    identifier
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Footnote ids end up in `id`/`href` attributes; keep them to a safe alphabet.
fn safe_id(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

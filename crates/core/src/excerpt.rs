//! Excerpt derivation: the `more` marker and plain-text summaries.

use crate::code_fence::FenceTracker;
use markdown::mdast::Node;
use std::borrow::Cow;
use std::ops::Range;

/// Default excerpt length, in characters, before the ellipsis.
pub const EXCERPT_LIMIT: usize = 260;

/// Marker lines, compared with all whitespace removed.
const MARKERS: [&str; 2] = ["<!--more-->", "{/*more*/}"];

/// Byte range of the first marker line outside fenced code, including its
/// line terminator.
pub fn find_marker(body: &str) -> Option<Range<usize>> {
    let mut fences = FenceTracker::new();
    let mut start = 0;
    for line in body.split_inclusive('\n') {
        let end = start + line.len();
        if !fences.feed(line) && is_marker(line) {
            return Some(start..end);
        }
        start = end;
    }
    None
}

fn is_marker(line: &str) -> bool {
    let compact: String = line.split_whitespace().collect();
    MARKERS.contains(&compact.as_str())
}

/// Source text before the marker, if the body has one.
pub fn lead_before_marker(body: &str) -> Option<&str> {
    find_marker(body).map(|range| &body[..range.start])
}

/// Text hook blanking the marker line so it never reaches the output.
/// The line break stays, so later source lines keep their numbers.
pub fn strip_marker(body: &str) -> Cow<'_, str> {
    match find_marker(body) {
        Some(range) => {
            let line = &body[range.clone()];
            let ending = if line.ends_with("\r\n") {
                "\r\n"
            } else if line.ends_with('\n') {
                "\n"
            } else {
                ""
            };
            let mut out = String::with_capacity(body.len() - range.len() + ending.len());
            out.push_str(&body[..range.start]);
            out.push_str(ending);
            out.push_str(&body[range.end..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(body),
    }
}

/// Plain text of the paragraph-like blocks of `root`, whitespace collapsed
/// and blocks joined with a single space.
///
/// Headings, code, tables, math, HTML and footnote definitions are skipped.
pub fn plain_text(root: &Node) -> String {
    let mut blocks = Vec::new();
    collect_blocks(root, &mut blocks);
    blocks
        .iter()
        .flat_map(|block| block.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_blocks(node: &Node, out: &mut Vec<String>) {
    match node {
        Node::Paragraph(paragraph) => {
            let mut text = String::new();
            for child in &paragraph.children {
                collect_inline(child, &mut text);
            }
            if !text.trim().is_empty() {
                out.push(text);
            }
        }
        Node::Root(_)
        | Node::Blockquote(_)
        | Node::List(_)
        | Node::ListItem(_)
        | Node::MdxJsxFlowElement(_) => {
            if let Some(children) = node.children() {
                for child in children {
                    collect_blocks(child, out);
                }
            }
        }
        _ => {}
    }
}

fn collect_inline(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&text.value),
        Node::InlineCode(code) => out.push_str(&code.value),
        Node::Break(_) => out.push(' '),
        Node::Emphasis(_)
        | Node::Strong(_)
        | Node::Delete(_)
        | Node::Link(_)
        | Node::LinkReference(_)
        | Node::MdxJsxTextElement(_) => {
            if let Some(children) = node.children() {
                for child in children {
                    collect_inline(child, out);
                }
            }
        }
        _ => {}
    }
}

/// Shortens `text` to at most `limit` characters, cutting at the last
/// whitespace inside the limit and appending `…`.
///
/// ```
/// use inkpress_core::excerpt::truncate;
///
/// assert_eq!(truncate("short", 10), "short");
/// assert_eq!(truncate("one two three", 9), "one two…");
/// ```
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .nth(limit)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let head = &text[..cut];
    // The char right after the limit being whitespace means `head` ends on a
    // word boundary already.
    let boundary = if text[cut..].starts_with(char::is_whitespace) {
        cut
    } else {
        head.rfind(char::is_whitespace).unwrap_or(cut)
    };
    let mut out = head[..boundary].trim_end().to_string();
    out.push('…');
    out
}

/// Plain text of `root`, truncated to `limit`.
pub fn from_tree(root: &Node, limit: usize) -> String {
    truncate(&plain_text(root), limit)
}

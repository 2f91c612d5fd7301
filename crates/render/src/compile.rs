//! The compiled unit stored with each document.

use crate::tree::{Element, Node};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format version written into every compiled body.
pub const FORMAT_VERSION: u32 = 1;

/// A self-contained, serializable render tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledBody {
    /// Format version; the runtime refuses other versions.
    pub version: u32,
    /// Top-level nodes.
    pub children: Vec<Node>,
}

/// Malformed trees rejected at compile time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// A tag name that cannot be written as markup.
    #[error("invalid tag name '{0}'")]
    InvalidTag(String),
    /// An attribute name that cannot be written as markup.
    #[error("invalid attribute name '{name}' on <{tag}>")]
    InvalidAttribute {
        /// Element tag.
        tag: String,
        /// Offending attribute.
        name: String,
    },
    /// Inline event handlers are never emitted.
    #[error("event handler attribute '{name}' on <{tag}>")]
    EventHandler {
        /// Element tag.
        tag: String,
        /// Offending attribute.
        name: String,
    },
    /// Script URLs are never emitted.
    #[error("script URL in '{name}' on <{tag}>")]
    ScriptUrl {
        /// Element tag.
        tag: String,
        /// Offending attribute.
        name: String,
    },
    /// Serialized form could not be produced or read.
    #[error("compiled body JSON: {0}")]
    Json(String),
}

impl CompiledBody {
    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String, CompileError> {
        serde_json::to_string(self).map_err(|err| CompileError::Json(err.to_string()))
    }

    /// Reads JSON written by [`CompiledBody::to_json`].
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(|err| CompileError::Json(err.to_string()))
    }
}

/// Validates a transformed tree and wraps it as a [`CompiledBody`].
pub fn compile(children: Vec<Node>) -> Result<CompiledBody, CompileError> {
    validate_nodes(&children)?;
    Ok(CompiledBody {
        version: FORMAT_VERSION,
        children,
    })
}

fn validate_nodes(nodes: &[Node]) -> Result<(), CompileError> {
    for node in nodes {
        if let Node::Element(el) = node {
            validate_element(el)?;
            validate_nodes(&el.children)?;
        }
    }
    Ok(())
}

fn validate_element(el: &Element) -> Result<(), CompileError> {
    if !is_valid_tag(&el.tag) {
        return Err(CompileError::InvalidTag(el.tag.clone()));
    }
    for (name, value) in &el.props {
        if !is_valid_attribute(name) {
            return Err(CompileError::InvalidAttribute {
                tag: el.tag.clone(),
                name: name.clone(),
            });
        }
        if name.len() > 2 && name.as_bytes()[..2].eq_ignore_ascii_case(b"on") {
            return Err(CompileError::EventHandler {
                tag: el.tag.clone(),
                name: name.clone(),
            });
        }
        if matches!(name.as_str(), "href" | "src" | "xlink:href" | "action" | "formaction")
            && is_script_url(value)
        {
            return Err(CompileError::ScriptUrl {
                tag: el.tag.clone(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// ASCII letter first, then letters, digits, `-`, `_`, `.` or `:`.
fn is_valid_tag(tag: &str) -> bool {
    let mut bytes = tag.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

fn is_valid_attribute(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            !c.is_whitespace()
                && !c.is_control()
                && !matches!(c, '"' | '\'' | '>' | '<' | '/' | '=' | '`')
        })
}

fn is_script_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:") || compact.starts_with("vbscript:")
}

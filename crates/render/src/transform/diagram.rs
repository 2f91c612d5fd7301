//! Diagram code blocks (`mermaid` by default).
//!
//! With [`DiagramStrategy::InlineSvg`] blocks are rendered at build time by a
//! [`DiagramRenderer`] and embedded as SVG. With [`DiagramStrategy::Client`]
//! they become `<pre class="mermaid">` for a view-time script.

use super::{PassContext, TransformError, TreePass, svg};
use crate::tree::{Element, Node};
use inkpress_core::Warning;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use thiserror::Error;

/// When diagrams are turned into graphics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramStrategy {
    /// Render to SVG during the build.
    #[default]
    InlineSvg,
    /// Leave the source for client-side rendering.
    Client,
}

/// What a failed render does to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramPolicy {
    /// Keep the source block, flag it and warn.
    #[default]
    Degrade,
    /// Fail the document.
    Fatal,
}

/// Why a diagram could not be rendered.
#[derive(Debug, Error)]
pub enum DiagramError {
    /// The renderer program is not installed.
    #[error("`{command}` not found on PATH")]
    Unavailable {
        /// Program name.
        command: String,
    },
    /// The renderer ran and failed.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        /// Program name.
        command: String,
        /// Exit status.
        status: String,
        /// Captured stderr.
        stderr: String,
    },
    /// The renderer rejected the source.
    #[error("{0}")]
    Invalid(String),
    /// The renderer does not handle this language.
    #[error("no renderer for '{0}' diagrams")]
    Language(String),
    /// Scratch files could not be written or read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Turns diagram source into SVG markup.
pub trait DiagramRenderer: Send + Sync {
    /// Renders `source` written in `language`.
    fn render(&self, language: &str, source: &str) -> Result<String, DiagramError>;
}

impl<F> DiagramRenderer for F
where
    F: Fn(&str, &str) -> Result<String, DiagramError> + Send + Sync,
{
    fn render(&self, language: &str, source: &str) -> Result<String, DiagramError> {
        (self)(language, source)
    }
}

/// Renders mermaid diagrams with the mermaid CLI (`mmdc`).
#[derive(Debug, Clone)]
pub struct MermaidCli {
    command: String,
}

impl Default for MermaidCli {
    fn default() -> Self {
        Self::new("mmdc")
    }
}

impl MermaidCli {
    /// Uses `command` (a name looked up on `PATH`, or a path).
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Whether the program can be found.
    pub fn is_available(&self) -> bool {
        self.locate().is_ok()
    }

    fn locate(&self) -> Result<PathBuf, DiagramError> {
        which::which(&self.command).map_err(|_| DiagramError::Unavailable {
            command: self.command.clone(),
        })
    }

    /// Site palette: white nodes, dark text, light borders, transparent background.
    fn config() -> serde_json::Value {
        serde_json::json!({
            "theme": "base",
            "themeVariables": {
                "primaryColor": "#ffffff",
                "primaryTextColor": "#111111",
                "primaryBorderColor": "#e5e7eb",
                "lineColor": "#9ca3af",
                "tertiaryColor": "#f7f7f7",
                "background": "transparent"
            }
        })
    }
}

impl DiagramRenderer for MermaidCli {
    fn render(&self, language: &str, source: &str) -> Result<String, DiagramError> {
        if language != "mermaid" {
            return Err(DiagramError::Language(language.to_string()));
        }
        let program = self.locate()?;

        let dir = tempfile::tempdir()?;
        let input = dir.path().join("diagram.mmd");
        let output = dir.path().join("diagram.svg");
        let config = dir.path().join("config.json");
        fs::write(&input, source)?;
        fs::write(&config, Self::config().to_string())?;

        let result = Command::new(&program)
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .arg("-c")
            .arg(&config)
            .arg("-I")
            .arg(svg_id(source))
            .args(["-b", "transparent", "-q"])
            .output()?;

        if !result.status.success() {
            return Err(DiagramError::Failed {
                command: self.command.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(fs::read_to_string(&output)?)
    }
}

/// Id for the root `<svg>`; mermaid scopes its styles to it, so blocks on
/// one page need different ids.
fn svg_id(source: &str) -> String {
    let hash = blake3::hash(source.as_bytes());
    format!("mermaid-{}", hex::encode(&hash.as_bytes()[..6]))
}

/// The diagram pass.
pub struct Diagrams {
    strategy: DiagramStrategy,
    policy: DiagramPolicy,
    languages: Vec<String>,
    renderer: Arc<dyn DiagramRenderer>,
}

impl Default for Diagrams {
    fn default() -> Self {
        Self::new(DiagramStrategy::default(), DiagramPolicy::default())
    }
}

impl Diagrams {
    /// Handles `mermaid` blocks with the mermaid CLI.
    pub fn new(strategy: DiagramStrategy, policy: DiagramPolicy) -> Self {
        Self {
            strategy,
            policy,
            languages: vec!["mermaid".to_string()],
            renderer: Arc::new(MermaidCli::default()),
        }
    }

    /// Replaces the renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replaces the list of fence languages treated as diagrams.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    fn diagram_source(&self, pre: &Element) -> Option<(String, String)> {
        if pre.tag != "pre" || pre.props.contains_key("data-diagram-error") {
            return None;
        }
        let [Node::Element(code)] = pre.children.as_slice() else {
            return None;
        };
        let language = code.language().filter(|_| code.tag == "code")?;
        self.languages
            .iter()
            .any(|known| known == language)
            .then(|| (language.to_string(), code.text_content()))
    }

    fn render_block(
        &self,
        pre: &Element,
        language: String,
        source: String,
        ctx: &mut PassContext,
    ) -> Result<Node, TransformError> {
        if self.strategy == DiagramStrategy::Client {
            return Ok(Element::new("pre")
                .with_prop("class", language)
                .with_child(Node::text(source))
                .into());
        }

        match self.renderer.render(&language, &source) {
            Ok(markup) => {
                let markup = svg::polish(&markup).unwrap_or_else(|err| {
                    log::debug!("keeping {language} SVG as rendered: {err}");
                    markup
                });
                Ok(Element::new("div")
                    .with_prop("class", "diagram")
                    .with_prop("data-diagram", language)
                    .with_child(Node::raw(markup))
                    .into())
            }
            Err(err) => match self.policy {
                DiagramPolicy::Fatal => Err(TransformError::Diagram {
                    language,
                    message: err.to_string(),
                }),
                DiagramPolicy::Degrade => {
                    log::warn!("{language} diagram kept as source: {err}");
                    ctx.diagnostics.add_warning(Warning::DiagramFallback {
                        language,
                        message: err.to_string(),
                    });
                    let mut kept = pre.clone();
                    kept.set_prop("data-diagram-error", "");
                    Ok(kept.into())
                }
            },
        }
    }

    fn rewrite(&self, nodes: &mut [Node], ctx: &mut PassContext) -> Result<(), TransformError> {
        for node in nodes {
            let Node::Element(el) = node else {
                continue;
            };
            if let Some((language, source)) = self.diagram_source(el) {
                let replacement = self.render_block(el, language, source, ctx)?;
                *node = replacement;
                continue;
            }
            self.rewrite(&mut el.children, ctx)?;
        }
        Ok(())
    }
}

impl TreePass for Diagrams {
    fn name(&self) -> &'static str {
        "diagrams"
    }

    fn transform(&self, nodes: &mut Vec<Node>, ctx: &mut PassContext) -> Result<(), TransformError> {
        self.rewrite(nodes, ctx)
    }
}

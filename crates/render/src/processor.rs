//! Body text to compiled unit: parse, lower, transform, compile.

use crate::compile::{CompileError, CompiledBody, compile};
use crate::lower::{LowerOptions, lower};
use crate::transform::{
    AutolinkHeadings, DiagramPolicy, DiagramRenderer, DiagramStrategy, Diagrams, HeadingEntry,
    HeadingIds, Highlight, HighlightThemes, MermaidCli, PassContext, TransformChain,
    TransformError,
};
use inkpress_core::excerpt::{self, EXCERPT_LIMIT};
use inkpress_core::{ContentError, Diagnostics, ParseOptions, ParserPipeline, SourceKind, normalize_newlines};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Settings for the body pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct ProcessorOptions {
    /// Keep raw HTML from `.md` files as markup instead of escaping it.
    pub allow_raw_html: bool,
    /// When diagrams become graphics.
    pub diagram_strategy: DiagramStrategy,
    /// What a failed diagram does to the build.
    pub diagram_policy: DiagramPolicy,
    /// Fence languages treated as diagrams.
    pub diagram_languages: Vec<String>,
    /// Program used to render mermaid diagrams.
    pub mermaid_command: String,
    /// Highlighting themes.
    pub themes: HighlightThemes,
    /// Derived excerpt length before the ellipsis.
    pub excerpt_limit: usize,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            allow_raw_html: false,
            diagram_strategy: DiagramStrategy::default(),
            diagram_policy: DiagramPolicy::default(),
            diagram_languages: vec!["mermaid".to_string()],
            mermaid_command: "mmdc".to_string(),
            themes: HighlightThemes::default(),
            excerpt_limit: EXCERPT_LIMIT,
        }
    }
}

/// Any fatal failure while processing one body.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Parse error or unsupported construct.
    #[error(transparent)]
    Content(#[from] ContentError),
    /// A pass failed.
    #[error(transparent)]
    Transform(#[from] TransformError),
    /// The transformed tree is malformed.
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Everything produced from one body.
#[derive(Debug, Clone)]
pub struct Processed {
    /// The compiled unit.
    pub body: CompiledBody,
    /// Table of contents.
    pub headings: Vec<HeadingEntry>,
    /// Excerpt derived from the body (marker lead, else whole body).
    pub excerpt: String,
    /// Non-fatal warnings.
    pub diagnostics: Diagnostics,
}

/// The configured pipeline; shareable across threads.
pub struct Processor {
    markdown: ParserPipeline,
    mdx: ParserPipeline,
    lower: LowerOptions,
    chain: TransformChain,
    excerpt_limit: usize,
}

impl Processor {
    /// Builds the pipeline, rendering diagrams with the mermaid CLI.
    pub fn new(options: &ProcessorOptions) -> Self {
        let renderer = Arc::new(MermaidCli::new(options.mermaid_command.clone()));
        Self::with_diagram_renderer(options, renderer)
    }

    /// Builds the pipeline with a custom diagram renderer.
    pub fn with_diagram_renderer(options: &ProcessorOptions, renderer: Arc<dyn DiagramRenderer>) -> Self {
        let diagrams = Diagrams::new(options.diagram_strategy, options.diagram_policy)
            .with_languages(options.diagram_languages.clone())
            .with_renderer(renderer);
        let chain = TransformChain::new()
            .with_pass(HeadingIds)
            .with_pass(AutolinkHeadings)
            .with_pass(diagrams)
            .with_pass(Highlight::new(&options.themes).skip_languages(options.diagram_languages.clone()));

        let mut markdown_options = ParseOptions::markdown();
        markdown_options.raw_html = options.allow_raw_html;

        Self {
            markdown: pipeline(markdown_options),
            mdx: pipeline(ParseOptions::mdx()),
            lower: LowerOptions {
                allow_raw_html: options.allow_raw_html,
            },
            chain,
            excerpt_limit: options.excerpt_limit,
        }
    }

    /// Names of the tree passes, in run order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.chain.pass_names()
    }

    /// Processes a document body (front-matter already removed).
    pub fn process(&self, body: &str, kind: SourceKind) -> Result<Processed, ProcessError> {
        let pipeline = match kind {
            SourceKind::Markdown => &self.markdown,
            SourceKind::Mdx => &self.mdx,
        };
        let root = pipeline.parse(body)?;

        let normalized = normalize_newlines(body);
        let excerpt = excerpt::lead_before_marker(&normalized)
            .and_then(|lead| match pipeline.parse(lead) {
                Ok(lead_root) => Some(excerpt::from_tree(&lead_root, self.excerpt_limit)),
                Err(err) => {
                    log::debug!("excerpt lead does not parse on its own ({err}), using the full body");
                    None
                }
            })
            .unwrap_or_else(|| excerpt::from_tree(&root, self.excerpt_limit));

        let mut children = lower(&root, &self.lower)?;
        let mut ctx = PassContext::default();
        self.chain.run(&mut children, &mut ctx)?;
        let body = compile(children)?;

        Ok(Processed {
            body,
            headings: ctx.headings,
            excerpt,
            diagnostics: ctx.diagnostics,
        })
    }

    /// Runs the tree passes again over already transformed nodes.
    pub fn retransform(&self, nodes: &mut Vec<crate::tree::Node>) -> Result<PassContext, TransformError> {
        let mut ctx = PassContext::default();
        self.chain.run(nodes, &mut ctx)?;
        Ok(ctx)
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("chain", &self.chain)
            .field("lower", &self.lower)
            .finish_non_exhaustive()
    }
}

fn pipeline(options: ParseOptions) -> ParserPipeline {
    let mut pipeline = ParserPipeline::new(options);
    pipeline.add_text_transform(normalize_newlines);
    pipeline.add_text_transform(excerpt::strip_marker);
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use crate::registry::ComponentTable;
    use crate::transform::DiagramError;
    use crate::tree::to_html;

    fn processor() -> Processor {
        let renderer: Arc<dyn DiagramRenderer> =
            Arc::new(|_: &str, _: &str| Ok::<_, DiagramError>("<svg><g class=\"node\"><rect></rect></g></svg>".to_string()));
        Processor::with_diagram_renderer(&ProcessorOptions::default(), renderer)
    }

    #[test]
    fn passes_run_in_registration_order() {
        assert_eq!(
            processor().pass_names(),
            vec!["heading-ids", "autolink-headings", "diagrams", "highlight"]
        );
    }

    #[test]
    fn hello_world_body() {
        let out = processor()
            .process("# Hi\n\nHello **world**.\n", SourceKind::Mdx)
            .unwrap();
        insta::assert_snapshot!(
            to_html(&out.body.children),
            @r##"<h1 id="hi"><a class="heading-anchor" href="#hi">Hi</a></h1><p>Hello <strong>world</strong>.</p>"##
        );
        assert_eq!(out.excerpt, "Hello world.");
        assert_eq!(out.headings.len(), 1);
        assert_eq!(out.headings[0].slug, "hi");
    }

    #[test]
    fn marker_bounds_the_excerpt_and_disappears() {
        let body = "Intro text.\n\n<!-- more -->\n\nRest of the post.\n";
        let out = processor().process(body, SourceKind::Markdown).unwrap();
        assert_eq!(out.excerpt, "Intro text.");
        let html = to_html(&out.body.children);
        assert!(!html.contains("more"), "{html}");
        assert!(html.contains("Rest of the post."), "{html}");
    }

    #[test]
    fn whole_chain_is_idempotent() {
        let body = "## Setup\n\n## Setup\n\n```rust\nfn main() {}\n```\n\n```mermaid\ngraph TD\n```\n";
        let processor = processor();
        let out = processor.process(body, SourceKind::Markdown).unwrap();
        let mut again = out.body.children.clone();
        let ctx = processor.retransform(&mut again).unwrap();
        assert_eq!(again, out.body.children);
        assert_eq!(ctx.headings, out.headings);
        assert_eq!(
            out.headings.iter().map(|h| h.slug.as_str()).collect::<Vec<_>>(),
            ["setup", "setup-1"]
        );
    }

    #[test]
    fn mdx_expressions_are_rejected_with_location() {
        let err = processor()
            .process("Hello\n\n{1 + 1}\n", SourceKind::Mdx)
            .unwrap_err();
        let ProcessError::Content(ContentError::Unsupported { location, .. }) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(location.line, 3);
    }

    #[test]
    fn locations_after_the_marker_keep_their_line() {
        let err = processor()
            .process("Lead.\n\n{/* more */}\n\n{1 + 1}\n", SourceKind::Mdx)
            .unwrap_err();
        let ProcessError::Content(ContentError::Unsupported { location, .. }) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(location.line, 5);
    }

    #[test]
    fn unicode_jsx_attribute_names_compile() {
        let out = processor()
            .process("<Note 日本=\"x\">hi</Note>\n", SourceKind::Mdx)
            .unwrap();
        assert!(to_html(&out.body.children).contains("日本=\"x\""));
    }

    #[test]
    fn compiled_body_renders_after_json_round_trip() {
        let out = processor()
            .process("Read [the docs](https://example.com).\n", SourceKind::Markdown)
            .unwrap();
        let json = out.body.to_json().unwrap();
        let rendered = Runtime::render_json(&json, &ComponentTable::typography()).unwrap();
        let html = rendered.to_html();
        assert!(html.starts_with("<p class=\"leading-7 [&amp;:not(:first-child)]:mt-6\">Read <a class="), "{html}");
        assert!(html.contains("target=\"_blank\""), "{html}");
        assert_eq!(rendered.text_content(), "Read the docs.");
    }
}

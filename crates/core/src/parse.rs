//! Markdown/MDX parsing with ordered text and tree hooks.

use crate::{ContentError, SourceLocation};
use markdown::mdast::Node;
use markdown::message::{Message, Place};
use std::borrow::Cow;
use std::path::Path;

/// Which dialect a source file is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// CommonMark + GFM.
    Markdown,
    /// Markdown with JSX elements (`.mdx`).
    Mdx,
}

impl SourceKind {
    /// Picks the dialect from a file extension; anything but `.mdx` is Markdown.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mdx") => SourceKind::Mdx,
            _ => SourceKind::Markdown,
        }
    }
}

/// Parser options for building markdown-rs parse options.
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    /// Enable MDX constructs (JSX, ESM, expressions).
    pub mdx: bool,
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Enable indented code blocks.
    pub code_indented: bool,
    /// Allow raw HTML nodes in the AST.
    pub raw_html: bool,
    /// Enable math constructs ($inline$ and $$block$$).
    pub math: bool,
}

impl ParseOptions {
    /// Blog Markdown defaults: GFM on, raw HTML off.
    pub const fn markdown() -> Self {
        Self {
            mdx: false,
            gfm: true,
            code_indented: true,
            raw_html: false,
            math: false,
        }
    }

    /// MDX defaults: JSX/ESM/expressions on, indented code off so that
    /// indented JSX children stay paragraphs.
    pub const fn mdx() -> Self {
        Self {
            mdx: true,
            gfm: true,
            code_indented: false,
            raw_html: false,
            math: false,
        }
    }

    /// Defaults for the given dialect.
    pub const fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Markdown => Self::markdown(),
            SourceKind::Mdx => Self::mdx(),
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            // Front-matter is stripped before parsing; never parse it as content.
            frontmatter: false,
            code_indented: self.code_indented,
            html_flow: self.raw_html && !self.mdx,
            html_text: self.raw_html && !self.mdx,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        if self.mdx {
            constructs.mdx_esm = true;
            constructs.mdx_expression_flow = true;
            constructs.mdx_expression_text = true;
            constructs.mdx_jsx_flow = true;
            constructs.mdx_jsx_text = true;
        }

        if self.math {
            constructs.math_flow = true;
            constructs.math_text = true;
        }

        // markdown-rs only recognises import/export lines when an ESM hook is
        // present. Accept them here; lowering reports them as unsupported.
        let mdx_esm_parse: Option<Box<markdown::MdxEsmParse>> = if self.mdx {
            Some(Box::new(|_: &str| markdown::MdxSignal::Ok))
        } else {
            None
        };

        markdown::ParseOptions {
            constructs,
            math_text_single_dollar: self.math,
            mdx_esm_parse,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::markdown()
    }
}

/// Rewrites raw document text before parsing.
pub trait TextTransform: Send + Sync {
    /// Transform the input text, returning an owned or borrowed string.
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

impl<F> TextTransform for F
where
    F: for<'a> Fn(&'a str) -> Cow<'a, str> + Send + Sync,
{
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str> {
        (self)(input)
    }
}

/// Mutates the parsed mdast in place.
pub trait AstTransform: Send + Sync {
    /// Mutate the parsed markdown AST in place.
    fn transform(&self, root: &mut Node);
}

impl<F> AstTransform for F
where
    F: Fn(&mut Node) + Send + Sync,
{
    fn transform(&self, root: &mut Node) {
        (self)(root)
    }
}

/// Parse options plus ordered text and AST hooks.
///
/// Options are converted per parse; markdown-rs options are not `Sync`.
pub struct ParserPipeline {
    options: ParseOptions,
    text_transforms: Vec<Box<dyn TextTransform>>,
    ast_transforms: Vec<Box<dyn AstTransform>>,
}

impl ParserPipeline {
    /// Create a pipeline with no hooks.
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            text_transforms: Vec::new(),
            ast_transforms: Vec::new(),
        }
    }

    /// Append a text hook; hooks run in registration order.
    pub fn add_text_transform<T: TextTransform + 'static>(&mut self, transform: T) {
        self.text_transforms.push(Box::new(transform));
    }

    /// Append an AST hook; hooks run in registration order.
    pub fn add_ast_transform<T: AstTransform + 'static>(&mut self, transform: T) {
        self.ast_transforms.push(Box::new(transform));
    }

    /// Applies only the text hooks.
    pub fn preprocess<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(input);
        for transform in &self.text_transforms {
            if let Cow::Owned(next) = transform.transform(current.as_ref()) {
                current = Cow::Owned(next);
            }
        }
        current
    }

    /// Runs text hooks, parses, then runs AST hooks.
    pub fn parse(&self, input: &str) -> Result<Node, ContentError> {
        let text = self.preprocess(input);
        let mut root = parse_mdast(&text, &self.options)?;
        for transform in &self.ast_transforms {
            transform.transform(&mut root);
        }
        Ok(root)
    }
}

/// Text hook: turns CRLF and lone CR line endings into LF.
pub fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if input.contains('\r') {
        Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(input)
    }
}

/// Parse markdown into an MDAST tree using core options.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, ContentError> {
    parse_mdast_with_options(input, &options.to_markdown())
}

/// Parse markdown into an MDAST tree using markdown-rs `ParseOptions`.
pub fn parse_mdast_with_options(
    input: &str,
    options: &markdown::ParseOptions,
) -> Result<Node, ContentError> {
    markdown::to_mdast(input, options).map_err(|err| ContentError::MarkdownAdapter {
        message: err.reason.clone(),
        location: message_location(&err),
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match message.place.as_deref() {
        Some(Place::Point(point)) => SourceLocation::new(point.line, point.column),
        Some(Place::Position(position)) => {
            SourceLocation::new(position.start.line, position.start.column)
        }
        None => SourceLocation::new(1, 1),
    }
}

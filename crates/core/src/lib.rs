#![deny(missing_docs)]
//! inkpress core: front-matter, the post schema, slugs, parsing and excerpts.

/// Fenced code tracking for line-based text passes.
pub mod code_fence;
/// Core error and diagnostic types.
pub mod error;
pub mod excerpt;
/// YAML front-matter extraction.
pub mod frontmatter;
pub mod parse;
pub mod schema;
pub mod slug;

pub use error::{ContentError, Diagnostics, SourceLocation, Warning};
pub use frontmatter::{FrontmatterError, FrontmatterExtraction, RawFields, extract_frontmatter};
pub use parse::{
    AstTransform, ParseOptions, ParserPipeline, SourceKind, TextTransform, normalize_newlines,
    parse_mdast, parse_mdast_with_options,
};
pub use schema::{PostMeta, PostSchema, ValidationError};
pub use slug::{Slugger, document_slug, extract_custom_id, heading_slug};

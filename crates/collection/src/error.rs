//! Build errors. Every variant is fatal and names the source file involved.

use crate::config::ConfigError;
use inkpress_core::{FrontmatterError, ValidationError};
use inkpress_render::ProcessError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a build failed.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The content pattern is not a valid glob.
    #[error("invalid content pattern `{pattern}`: {source}")]
    Pattern {
        /// Pattern as configured.
        pattern: String,
        /// Glob error.
        #[source]
        source: globset::Error,
    },

    /// A file or directory could not be read or written.
    #[error("IO error on `{}`: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The front-matter block is malformed.
    #[error("{}: {source}", path.display())]
    Frontmatter {
        /// Source file.
        path: PathBuf,
        /// Extraction error.
        #[source]
        source: FrontmatterError,
    },

    /// A field failed schema validation.
    #[error("{}: {source}", path.display())]
    Validation {
        /// Source file.
        path: PathBuf,
        /// Field and constraint.
        #[source]
        source: ValidationError,
    },

    /// Parsing, transforming or compiling the body failed.
    #[error("{}: {source}", path.display())]
    Process {
        /// Source file.
        path: PathBuf,
        /// Pipeline error.
        #[source]
        source: ProcessError,
    },

    /// Two documents claim the same slug.
    #[error("duplicate slug `{slug}` in `{}` and `{}`", first.display(), second.display())]
    DuplicateSlug {
        /// The contested slug.
        slug: String,
        /// Earlier document in discovery order.
        first: PathBuf,
        /// Later document in discovery order.
        second: PathBuf,
    },

    /// A referenced local asset could not be resolved or written.
    #[error("{}: asset `{reference}`: {message}", path.display())]
    Asset {
        /// Document referencing the asset.
        path: PathBuf,
        /// Reference as written.
        reference: String,
        /// What went wrong.
        message: String,
    },

    /// The snapshot could not be serialized.
    #[error("snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The worker pool could not be created.
    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Source file the error is about, if any.
    pub fn source_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Io { path, .. }
            | Self::Frontmatter { path, .. }
            | Self::Validation { path, .. }
            | Self::Process { path, .. }
            | Self::Asset { path, .. } => Some(path),
            Self::DuplicateSlug { second, .. } => Some(second),
            Self::Config(_) | Self::Pattern { .. } | Self::Snapshot(_) | Self::ThreadPool(_) => None,
        }
    }
}

/// Result alias for the collection crate.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;

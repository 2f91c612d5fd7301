//! Source discovery.

use crate::error::{BuildError, Result};
use globset::{GlobBuilder, GlobMatcher};
use inkpress_core::SourceKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One matched source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path.
    pub path: PathBuf,
    /// Path relative to the content root, used in output and errors.
    pub relative: PathBuf,
    /// Markdown or MDX.
    pub kind: SourceKind,
}

/// Compiles a content pattern; `*` does not cross directories, `**` does.
pub fn matcher(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| BuildError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Files under `root` whose relative path matches `pattern`, sorted by path.
///
/// A missing root yields no files.
pub fn discover(root: &Path, pattern: &str) -> Result<Vec<SourceFile>> {
    let matcher = matcher(pattern)?;
    if !root.is_dir() {
        log::warn!("content root {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            BuildError::io(path, err.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if matcher.is_match(relative) {
            files.push(SourceFile {
                path: entry.path().to_path_buf(),
                relative: relative.to_path_buf(),
                kind: SourceKind::from_path(entry.path()),
            });
        }
    }
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    log::debug!("discovered {} source files under {}", files.len(), root.display());
    Ok(files)
}

use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Optional file path
    pub file: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }

    /// Create a source location with file information
    pub fn with_file(file: String, line: usize, column: usize) -> Self {
        Self {
            file: Some(file),
            line,
            column,
        }
    }

    /// Shift the line number by `lines`, e.g. to account for a stripped
    /// front-matter block above the body.
    pub fn offset_lines(mut self, lines: usize) -> Self {
        self.line += lines;
        self
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Errors raised while turning document text into a syntax tree.
#[derive(Debug, Error)]
pub enum ContentError {
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// A construct the pipeline cannot represent (MDX expressions, ESM).
    #[error("Unsupported construct at {location}: {construct}")]
    Unsupported {
        /// Human readable name of the construct
        construct: String,
        /// Source location
        location: SourceLocation,
    },
}

impl ContentError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MarkdownAdapter {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Create an unsupported-construct error with location
    pub fn unsupported(construct: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Unsupported {
            construct: construct.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Location of the offending input.
    pub fn location(&self) -> &SourceLocation {
        match self {
            ContentError::MarkdownAdapter { location, .. } => location,
            ContentError::Unsupported { location, .. } => location,
        }
    }
}

/// Non-fatal warnings collected while processing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A diagram failed to render and the raw source block was kept.
    DiagramFallback {
        /// Diagram language (e.g. `mermaid`)
        language: String,
        /// Renderer failure message
        message: String,
    },
    /// A code block named a language the highlighter does not know.
    UnknownLanguage {
        /// The language tag as written in the fence
        language: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::DiagramFallback { language, message } => {
                write!(f, "{language} diagram kept as source: {message}")
            }
            Warning::UnknownLanguage { language } => {
                write!(f, "no syntax definition for '{language}', highlighted as plain text")
            }
        }
    }
}

/// Collection of diagnostics produced while processing one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// List of non-fatal warnings
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the diagnostics collection
    pub fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Move every warning of `other` into this collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get total count of all diagnostics
    pub fn count(&self) -> usize {
        self.warnings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display_with_and_without_file() {
        assert_eq!(SourceLocation::new(3, 7).to_string(), "3:7");
        assert_eq!(
            SourceLocation::with_file("posts/a.md".into(), 3, 7).to_string(),
            "posts/a.md:3:7"
        );
    }

    #[test]
    fn offset_lines_shifts_only_the_line() {
        let loc = SourceLocation::new(2, 5).offset_lines(4);
        assert_eq!((loc.line, loc.column), (6, 5));
    }

    #[test]
    fn diagnostics_merge() {
        let mut a = Diagnostics::new();
        a.add_warning(Warning::DiagramFallback {
            language: "mermaid".into(),
            message: "parse error".into(),
        });
        let mut b = Diagnostics::new();
        b.add_warning(Warning::UnknownLanguage {
            language: "brainfuck".into(),
        });
        a.extend(b);
        assert_eq!(a.count(), 2);
        assert!(a.has_warnings());
        assert!(a.warnings[1].to_string().contains("brainfuck"));
    }

    #[test]
    fn every_warning_names_what_was_kept() {
        let fallback = Warning::DiagramFallback {
            language: "mermaid".into(),
            message: "bad arrow".into(),
        };
        assert_eq!(fallback.to_string(), "mermaid diagram kept as source: bad arrow");
        let unknown = Warning::UnknownLanguage { language: "cobol".into() };
        assert_eq!(
            unknown.to_string(),
            "no syntax definition for 'cobol', highlighted as plain text"
        );
    }
}

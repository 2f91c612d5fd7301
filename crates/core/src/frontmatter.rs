use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Raw front-matter fields, keyed by name, in source order.
pub type RawFields = Map<String, JsonValue>;

/// A source document split into its YAML header and its body.
#[derive(Debug)]
pub struct FrontmatterExtraction<'a> {
    /// Parsed header fields (empty when the document has no header).
    pub fields: RawFields,
    /// Markdown/MDX content after the closing fence.
    pub body: &'a str,
    /// Number of source lines that precede `body` (header and fences included).
    pub body_line_offset: usize,
}

/// Errors emitted while parsing or extracting front-matter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// Unclosed YAML fence (e.g., missing terminating `---`).
    #[error("unterminated front-matter block: expected closing '---'")]
    Unterminated,
    /// YAML failed to parse.
    #[error("front-matter is not valid YAML: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("front-matter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Splits `input` into header fields and body.
///
/// A header is a `---` fenced YAML block that opens on the first non-blank
/// line. A leading byte-order mark is ignored.
pub fn extract_frontmatter(input: &str) -> Result<FrontmatterExtraction<'_>, FrontmatterError> {
    let text = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lines = LineCursor::new(text);

    let opening = loop {
        match lines.next() {
            Some(line) if line.text.trim().is_empty() => continue,
            Some(line) if is_fence(line.text) => break line,
            _ => {
                return Ok(FrontmatterExtraction {
                    fields: RawFields::new(),
                    body: text,
                    body_line_offset: 0,
                });
            }
        }
    };

    let header_start = opening.end;
    for line in lines.by_ref() {
        if is_fence(line.text) {
            let header = &text[header_start..line.start];
            let fields = parse_header(header)?;
            return Ok(FrontmatterExtraction {
                fields,
                body: &text[line.end..],
                body_line_offset: line.number,
            });
        }
    }

    Err(FrontmatterError::Unterminated)
}

fn parse_header(header: &str) -> Result<RawFields, FrontmatterError> {
    if header.trim().is_empty() {
        return Ok(RawFields::new());
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(header).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    match serde_json::to_value(yaml).map_err(|err| FrontmatterError::Parse(err.to_string()))? {
        JsonValue::Null => Ok(RawFields::new()),
        JsonValue::Object(fields) => Ok(fields),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

struct Line<'a> {
    text: &'a str,
    start: usize,
    end: usize,
    /// 1-indexed line number.
    number: usize,
}

struct LineCursor<'a> {
    input: &'a str,
    pos: usize,
    number: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            number: 0,
        }
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.pos >= self.input.len() {
            return None;
        }
        let start = self.pos;
        let (text, end) = match self.input[start..].find('\n') {
            Some(idx) => (&self.input[start..start + idx], start + idx + 1),
            None => (&self.input[start..], self.input.len()),
        };
        self.pos = end;
        self.number += 1;
        Some(Line {
            text,
            start,
            end,
            number: self.number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(input: &str) -> FrontmatterExtraction<'_> {
        extract_frontmatter(input).expect("front-matter extraction should succeed")
    }

    #[test]
    fn document_without_header_is_all_body() {
        let result = extract("# Title\nBody");
        assert!(result.fields.is_empty());
        assert_eq!(result.body, "# Title\nBody");
        assert_eq!(result.body_line_offset, 0);
    }

    #[test]
    fn parses_post_header() {
        let input = "---\ntitle: Hello\ndate: 2024-01-01\ntags:\n  - rust\n  - blog\n---\n# Hi\n";
        let result = extract(input);
        assert_eq!(result.fields["title"], "Hello");
        // YAML dates stay strings so the schema decides how to read them.
        assert_eq!(result.fields["date"], "2024-01-01");
        assert_eq!(result.fields["tags"][1], "blog");
        assert_eq!(result.body, "# Hi\n");
        assert_eq!(result.body_line_offset, 7);
    }

    #[test]
    fn empty_header_yields_no_fields() {
        let result = extract("---\n---\n# Body");
        assert!(result.fields.is_empty());
        assert_eq!(result.body, "# Body");
    }

    #[test]
    fn tolerates_bom_blank_lines_and_crlf() {
        let result = extract("\u{feff}\n  \n---\r\nfoo: bar\r\n---\r\nBody");
        assert_eq!(result.fields["foo"], "bar");
        assert_eq!(result.body, "Body");
        assert_eq!(result.body_line_offset, 5);
    }

    #[test]
    fn rejects_invalid_yaml() {
        let err = extract_frontmatter("---\ninvalid: [unterminated\n---\n").unwrap_err();
        assert!(matches!(err, FrontmatterError::Parse(_)), "{err:?}");
    }

    #[test]
    fn rejects_sequence_root() {
        let err = extract_frontmatter("---\n- a\n- b\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontmatterError::InvalidRootType));
    }

    #[test]
    fn rejects_unterminated_block() {
        let err = extract_frontmatter("---\ntitle: test").unwrap_err();
        assert!(matches!(err, FrontmatterError::Unterminated));
    }
}

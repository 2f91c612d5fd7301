//! Line-level fenced code tracking.
//!
//! Text passes that look for markers in raw Markdown (the excerpt marker)
//! use this to leave the contents of fenced code blocks alone.

/// The fence currently open, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenFence {
    marker: char,
    length: usize,
}

/// Tracks whether successive lines are inside a fenced code block.
#[derive(Debug, Clone, Default)]
pub struct FenceTracker {
    open: Option<OpenFence>,
}

impl FenceTracker {
    /// Creates a tracker positioned outside any fence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last line fed left a fence open.
    pub fn is_inside(&self) -> bool {
        self.open.is_some()
    }

    /// Feeds one line and reports whether it belongs to a code block
    /// (fence delimiters included).
    pub fn feed(&mut self, line: &str) -> bool {
        let (columns, bytes) = leading_indent(line);
        let rest = &line[bytes..];

        match self.open {
            None => {
                // CommonMark: 4+ columns of indent is indented code, not a fence.
                if columns <= 3
                    && let Some((marker, length)) = fence_run(rest)
                {
                    self.open = Some(OpenFence { marker, length });
                    return true;
                }
                false
            }
            Some(open) => {
                if columns <= 3
                    && let Some((marker, length)) = fence_run(rest)
                    && marker == open.marker
                    && length >= open.length
                    && rest[length * marker.len_utf8()..].trim().is_empty()
                {
                    self.open = None;
                }
                true
            }
        }
    }
}

/// Returns (visual columns, byte length) of leading indentation; tabs
/// advance to the next multiple of four.
fn leading_indent(line: &str) -> (usize, usize) {
    let mut columns = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => columns += 1,
            b'\t' => columns += 4 - (columns % 4),
            _ => break,
        }
        bytes += 1;
    }
    (columns, bytes)
}

fn fence_run(text: &str) -> Option<(char, usize)> {
    let marker = text.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let length = text.chars().take_while(|c| *c == marker).count();
    (length >= 3).then_some((marker, length))
}

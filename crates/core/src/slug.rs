//! Slugs for headings (anchor ids) and for documents (routing keys).

use std::collections::HashMap;

/// Longest slug accepted for a document.
pub const MAX_DOCUMENT_SLUG_LEN: usize = 200;
/// Shortest slug accepted for a document.
pub const MIN_DOCUMENT_SLUG_LEN: usize = 3;

/// Splits a trailing `{#custom-id}` off heading text.
///
/// The id may only contain ASCII alphanumerics, `-` and `_`. When no valid
/// suffix is present the text is returned untouched.
///
/// ```
/// use inkpress_core::slug::extract_custom_id;
///
/// assert_eq!(extract_custom_id("Setup {#install}"), ("Setup", Some("install")));
/// assert_eq!(extract_custom_id("Setup {#bad id}"), ("Setup {#bad id}", None));
/// ```
pub fn extract_custom_id(text: &str) -> (&str, Option<&str>) {
    let trimmed = text.trim_end();
    let Some(inner) = trimmed.strip_suffix('}') else {
        return (text, None);
    };
    let Some(open) = inner.rfind("{#") else {
        return (text, None);
    };
    let id = &inner[open + 2..];
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        (inner[..open].trim_end(), Some(id))
    } else {
        (text, None)
    }
}

/// github-slugger compatible base slug, without duplicate handling.
///
/// Lowercases, keeps letters, digits, combining marks, `-` and `_`, turns
/// each space into `-` and drops everything else. Runs of hyphens are not
/// collapsed and edges are not trimmed.
pub fn heading_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            slug.push(ch.to_ascii_lowercase());
        } else if ch == ' ' {
            slug.push('-');
        } else if !ch.is_ascii() && (ch.is_alphanumeric() || is_combining_mark(ch)) {
            slug.extend(ch.to_lowercase());
        }
    }
    if slug.is_empty() {
        slug.push_str("heading");
    }
    slug
}

/// Per-document generator of unique heading ids.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    /// Creates a slugger with no ids taken.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a unique id for `text`; repeats get `-1`, `-2`, ... appended.
    pub fn next_slug(&mut self, text: &str) -> String {
        let base = heading_slug(text);
        let mut candidate = base.clone();
        loop {
            let count = self.seen.entry(base.clone()).or_insert(0);
            if *count > 0 {
                candidate = format!("{base}-{count}");
            }
            *count += 1;
            if candidate == base || !self.seen.contains_key(&candidate) {
                break;
            }
        }
        self.seen.entry(candidate.clone()).or_insert(1);
        candidate
    }

    /// Marks an id as taken (custom or pre-existing ids).
    pub fn reserve(&mut self, id: &str) {
        *self.seen.entry(id.to_string()).or_insert(0) += 1;
    }
}

/// Derives a document slug from a file stem: transliterated to ASCII,
/// lowercased, non-alphanumeric runs collapsed into single hyphens.
///
/// ```
/// use inkpress_core::slug::document_slug;
///
/// assert_eq!(document_slug("Hello, Wörld!"), "hello-world");
/// assert_eq!(document_slug("2024_01 notes"), "2024-01-notes");
/// ```
pub fn document_slug(stem: &str) -> String {
    let ascii = deunicode::deunicode(stem);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Whether `slug` is an acceptable routing key: lowercase ASCII words
/// separated by single hyphens.
pub fn is_valid_document_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|word| !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

/// Unicode combining marks (Mn/Mc/Me) for the scripts that show up in
/// headings; they must survive slugging for Indic, Thai, Arabic and Hebrew.
fn is_combining_mark(ch: char) -> bool {
    const RANGES: &[(u32, u32)] = &[
        (0x0300, 0x036F),
        (0x0483, 0x0489),
        (0x0591, 0x05BD),
        (0x05BF, 0x05C7),
        (0x0610, 0x061A),
        (0x064B, 0x065F),
        (0x0670, 0x0670),
        (0x0900, 0x0903),
        (0x093A, 0x094F),
        (0x0951, 0x0957),
        (0x0962, 0x0963),
        (0x0980, 0x0983),
        (0x09BC, 0x09CD),
        (0x0A01, 0x0A03),
        (0x0A3C, 0x0A4D),
        (0x0A81, 0x0A83),
        (0x0ABC, 0x0ACD),
        (0x0B01, 0x0B03),
        (0x0BBE, 0x0BCD),
        (0x0E31, 0x0E3A),
        (0x0E47, 0x0E4E),
        (0x1AB0, 0x1AFF),
        (0x1DC0, 0x1DFF),
        (0x302A, 0x302F),
        (0x3099, 0x309A),
        (0xFE20, 0xFE2F),
    ];
    let cp = ch as u32;
    RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

//! Post front-matter schema.
//!
//! Validation is pure: raw fields in, a typed [`PostMeta`] or the first
//! [`ValidationError`] out. Unknown keys are ignored.

use crate::frontmatter::RawFields;
use crate::slug::{MAX_DOCUMENT_SLUG_LEN, MIN_DOCUMENT_SLUG_LEN, document_slug, is_valid_document_slug};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// A front-matter field that failed its constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {constraint}")]
pub struct ValidationError {
    /// Field name as written in front-matter.
    pub field: String,
    /// Human readable constraint that was violated.
    pub constraint: String,
}

impl ValidationError {
    fn new(field: &str, constraint: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            constraint: constraint.into(),
        }
    }
}

/// Validated post metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMeta {
    /// Post title.
    pub title: String,
    /// Routing key, declared or derived from the file stem.
    pub slug: String,
    /// Publication date, normalised to UTC.
    pub date: DateTime<Utc>,
    /// Optional summary line.
    pub description: Option<String>,
    /// Unpublished posts are dropped from production builds.
    pub draft: bool,
    /// Tags in source order.
    pub tags: Vec<String>,
    /// Explicit excerpt; derived from the body when absent.
    pub excerpt: Option<String>,
    /// Cover image, URL or path relative to the document.
    pub image: Option<String>,
}

/// Field limits for posts.
#[derive(Debug, Clone, Copy)]
pub struct PostSchema {
    /// Maximum title length in characters.
    pub title_max: usize,
    /// Maximum description length in characters.
    pub description_max: usize,
    /// Maximum explicit excerpt length in characters.
    pub excerpt_max: usize,
}

impl Default for PostSchema {
    fn default() -> Self {
        Self {
            title_max: 120,
            description_max: 500,
            excerpt_max: 500,
        }
    }
}

const KNOWN_FIELDS: [&str; 8] = [
    "title",
    "slug",
    "date",
    "description",
    "draft",
    "tags",
    "excerpt",
    "image",
];

impl PostSchema {
    /// Validates `fields`; `stem` is the source file stem used when no slug
    /// is declared.
    pub fn validate(&self, fields: &RawFields, stem: &str) -> Result<PostMeta, ValidationError> {
        for key in fields.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                log::debug!("ignoring unknown front-matter field '{key}'");
            }
        }

        let title = required_string(fields, "title")?;
        check_max(&title, "title", self.title_max)?;

        let slug = match optional_string(fields, "slug")? {
            Some(slug) => slug,
            None => document_slug(stem),
        };
        check_slug(&slug)?;

        let date = match fields.get("date") {
            None | Some(JsonValue::Null) => {
                return Err(ValidationError::new("date", "is required"));
            }
            Some(JsonValue::String(raw)) => parse_date(raw)
                .ok_or_else(|| ValidationError::new("date", "is not a valid ISO-8601 date"))?,
            Some(_) => return Err(ValidationError::new("date", "expected a date string")),
        };

        let description = optional_string(fields, "description")?;
        if let Some(description) = &description {
            check_max(description, "description", self.description_max)?;
        }

        let draft = match fields.get("draft") {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::Bool(draft)) => *draft,
            Some(_) => return Err(ValidationError::new("draft", "expected a boolean")),
        };

        let tags = match fields.get("tags") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|item| match item {
                    JsonValue::String(tag) => Ok(tag.clone()),
                    _ => Err(ValidationError::new("tags", "expected a list of strings")),
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(ValidationError::new("tags", "expected a list of strings")),
        };

        let excerpt = optional_string(fields, "excerpt")?;
        if let Some(excerpt) = &excerpt {
            check_max(excerpt, "excerpt", self.excerpt_max)?;
        }

        let image = optional_string(fields, "image")?;

        Ok(PostMeta {
            title,
            slug,
            date,
            description,
            draft,
            tags,
            excerpt,
            image,
        })
    }
}

fn required_string(fields: &RawFields, field: &str) -> Result<String, ValidationError> {
    optional_string(fields, field)?.ok_or_else(|| ValidationError::new(field, "is required"))
}

fn optional_string(fields: &RawFields, field: &str) -> Result<Option<String>, ValidationError> {
    match fields.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ValidationError::new(field, "expected a string")),
    }
}

fn check_max(value: &str, field: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(field, format!("exceeds {max} characters")));
    }
    Ok(())
}

fn check_slug(slug: &str) -> Result<(), ValidationError> {
    let len = slug.len();
    if len < MIN_DOCUMENT_SLUG_LEN {
        return Err(ValidationError::new(
            "slug",
            format!("must be at least {MIN_DOCUMENT_SLUG_LEN} characters"),
        ));
    }
    if len > MAX_DOCUMENT_SLUG_LEN {
        return Err(ValidationError::new(
            "slug",
            format!("exceeds {MAX_DOCUMENT_SLUG_LEN} characters"),
        ));
    }
    if !is_valid_document_slug(slug) {
        return Err(ValidationError::new(
            "slug",
            "must be lowercase letters and digits separated by single hyphens",
        ));
    }
    Ok(())
}

/// Reads `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or RFC 3339.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// RFC 3339, UTC, millisecond precision: `2024-01-01T00:00:00.000Z`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter storing dates in the [`format_date`] shape.
pub mod date_format {
    use super::{format_date, parse_date};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Serialize a date as RFC 3339 with milliseconds.
    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_date(date))
    }

    /// Deserialize any date shape accepted by [`parse_date`].
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'")))
    }
}

use chrono::{DateTime, Utc};
use inkpress_core::schema::date_format;
use inkpress_render::{CompiledBody, HeadingEntry};
use serde::{Deserialize, Serialize};

/// One built post. Immutable once the collection is frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Post title.
    pub title: String,
    /// Unique routing key.
    pub slug: String,
    /// Publication date.
    #[serde(with = "date_format")]
    pub date: DateTime<Utc>,
    /// Optional summary line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unpublished.
    pub draft: bool,
    /// Tags in source order.
    pub tags: Vec<String>,
    /// Explicit or derived excerpt.
    pub excerpt: String,
    /// Cover image; local files are rewritten to their public URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// The compiled body.
    pub compiled_body: CompiledBody,
    /// Public path of the post.
    pub permalink: String,
    /// Table of contents.
    #[serde(default)]
    pub headings: Vec<HeadingEntry>,
    /// Source path relative to the content root.
    pub source_path: String,
}

impl Document {
    /// Whether the post carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use inkpress_render::{Element, Node, compile};

    #[test]
    fn serialized_field_names() {
        let doc = Document {
            title: "Hello".into(),
            slug: "hello".into(),
            date: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            description: None,
            draft: false,
            tags: vec!["rust".into()],
            excerpt: "Hi.".into(),
            image: None,
            compiled_body: compile(vec![Element::new("p").with_child(Node::text("Hi.")).into()]).unwrap(),
            permalink: "/blog/hello".into(),
            headings: Vec::new(),
            source_path: "posts/hello.md".into(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["date"], "2024-01-15T00:00:00.000Z");
        assert_eq!(json["compiledBody"]["version"], 1);
        assert_eq!(json["sourcePath"], "posts/hello.md");
        assert!(json.get("description").is_none());

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
        assert!(back.has_tag("rust"));
    }
}

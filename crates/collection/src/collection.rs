//! The frozen collection and the `prepare` hook.

use crate::config::BuildMode;
use crate::document::Document;
use std::collections::{BTreeSet, HashMap};

/// Named, discovery-ordered set of documents with a slug index.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    name: String,
    documents: Vec<Document>,
    index: HashMap<String, usize>,
}

impl Collection {
    /// Freezes `documents`. Slugs are expected to be unique; for a repeated
    /// slug the first document wins the index.
    pub fn new(name: impl Into<String>, documents: Vec<Document>) -> Self {
        let mut index = HashMap::with_capacity(documents.len());
        for (i, doc) in documents.iter().enumerate() {
            index.entry(doc.slug.clone()).or_insert(i);
        }
        Self {
            name: name.into(),
            documents,
            index,
        }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document by slug.
    pub fn get(&self, slug: &str) -> Option<&Document> {
        self.index.get(slug).map(|&i| &self.documents[i])
    }

    /// Every document in discovery order.
    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Newest first; equal dates keep discovery order.
    pub fn sorted_by_date(&self) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self.documents.iter().collect();
        docs.sort_by(|a, b| b.date.cmp(&a.date));
        docs
    }

    /// Every tag in use, sorted and deduplicated.
    pub fn tags(&self) -> Vec<&str> {
        self.documents
            .iter()
            .flat_map(|doc| doc.tags.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Documents carrying `tag`, in discovery order.
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents.iter().filter(move |doc| doc.has_tag(tag))
    }

    /// Consumes the collection, returning its documents.
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

/// What a `prepare` hook knows about the build.
#[derive(Debug, Clone, Copy)]
pub struct PrepareContext {
    /// Build mode.
    pub mode: BuildMode,
}

/// Collection-wide policy, run once after every document is built.
pub trait PrepareHook: Send + Sync {
    /// Edits the full document list in place.
    fn prepare(&self, documents: &mut Vec<Document>, ctx: &PrepareContext);
}

impl<F> PrepareHook for F
where
    F: Fn(&mut Vec<Document>, &PrepareContext) + Send + Sync,
{
    fn prepare(&self, documents: &mut Vec<Document>, ctx: &PrepareContext) {
        (self)(documents, ctx)
    }
}

/// Default hook: drops drafts in production builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DropDraftsInProduction;

impl PrepareHook for DropDraftsInProduction {
    fn prepare(&self, documents: &mut Vec<Document>, ctx: &PrepareContext) {
        if ctx.mode != BuildMode::Production {
            return;
        }
        let before = documents.len();
        documents.retain(|doc| !doc.draft);
        let dropped = before - documents.len();
        if dropped > 0 {
            log::info!("dropped {dropped} draft(s) from the production build");
        }
    }
}

//! The collection builder: discover, build each document in parallel,
//! check slugs, prepare, freeze.

use crate::assets::{self, AssetStore};
use crate::collection::{Collection, DropDraftsInProduction, PrepareContext, PrepareHook};
use crate::config::BuildConfig;
use crate::discover::{SourceFile, discover};
use crate::document::Document;
use crate::error::{BuildError, Result};
use crate::snapshot;
use inkpress_core::{ContentError, PostSchema, extract_frontmatter};
use inkpress_render::{ProcessError, Processor};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;

/// Counters logged after each build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Source files built.
    pub total: usize,
    /// Documents in the frozen collection.
    pub published: usize,
    /// Documents removed by the prepare hook.
    pub dropped: usize,
    /// Distinct asset files published.
    pub assets: usize,
    /// Non-fatal warnings.
    pub warnings: usize,
    /// Wall time in milliseconds.
    pub elapsed_ms: u128,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildOutput {
    /// The frozen collection.
    pub collection: Collection,
    /// Counters.
    pub stats: BuildStats,
}

struct Built {
    document: Document,
    warnings: usize,
}

/// Builds a collection from a [`BuildConfig`].
pub struct CollectionBuilder {
    config: BuildConfig,
    schema: PostSchema,
    processor: Processor,
    prepare: Box<dyn PrepareHook>,
}

impl CollectionBuilder {
    /// Builder with the configured pipeline and the draft-dropping hook.
    pub fn new(config: BuildConfig) -> Self {
        let processor = Processor::new(&config.markdown);
        Self {
            config,
            schema: PostSchema::default(),
            processor,
            prepare: Box::new(DropDraftsInProduction),
        }
    }

    /// Replaces the body pipeline.
    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = processor;
        self
    }

    /// Replaces the field limits.
    pub fn with_schema(mut self, schema: PostSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Replaces the prepare hook.
    pub fn with_prepare(mut self, hook: impl PrepareHook + 'static) -> Self {
        self.prepare = Box::new(hook);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Builds the collection in memory (assets are written).
    pub fn build(&self) -> Result<BuildOutput> {
        let start = Instant::now();
        let root = self.config.content_root();
        let files = discover(&root, &self.config.content.pattern)?;

        // A clean build publishes into a staging directory that replaces the
        // live one only once every document has built.
        let assets_dir = self.config.assets_dir();
        let staging = if self.config.output.clean {
            Some(staging_dir(&assets_dir)?)
        } else {
            None
        };
        let store = AssetStore::new(
            staging.as_ref().map_or_else(|| assets_dir.clone(), |dir| dir.path().to_path_buf()),
            self.config.output.base.clone(),
            self.config.output.name.clone(),
        );

        let results: Vec<Result<Built>> = match self.config.build.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
                .install(|| files.par_iter().map(|file| self.build_one(file, &store)).collect()),
            None => files.par_iter().map(|file| self.build_one(file, &store)).collect(),
        };

        // First failure in discovery order wins.
        let mut documents = Vec::with_capacity(results.len());
        let mut warnings = 0;
        for result in results {
            let built = result?;
            warnings += built.warnings;
            documents.push(built.document);
        }

        check_unique_slugs(&documents, &files)?;
        if let Some(staging) = staging {
            swap_in(staging, &assets_dir)?;
        }

        let total = documents.len();
        self.prepare.prepare(
            &mut documents,
            &PrepareContext {
                mode: self.config.build.mode,
            },
        );
        let collection = Collection::new(self.config.content.collection.clone(), documents);

        let stats = BuildStats {
            total,
            published: collection.len(),
            dropped: total.saturating_sub(collection.len()),
            assets: store.count(),
            warnings,
            elapsed_ms: start.elapsed().as_millis(),
        };
        log::info!(
            "built {} `{}` documents ({} published, {} dropped, {} assets, {} warnings) in {}ms [{}]",
            stats.total,
            collection.name(),
            stats.published,
            stats.dropped,
            stats.assets,
            stats.warnings,
            stats.elapsed_ms,
            self.config.build.mode,
        );
        Ok(BuildOutput { collection, stats })
    }

    /// Builds and writes the snapshot to the data directory.
    pub fn build_and_write(&self) -> Result<BuildOutput> {
        let output = self.build()?;
        let data_dir = self.config.data_dir();
        if self.config.output.clean {
            remove_dir(&data_dir)?;
        }
        snapshot::write_snapshot(&output.collection, &data_dir, chrono::Utc::now())?;
        Ok(output)
    }

    fn build_one(&self, file: &SourceFile, store: &AssetStore) -> Result<Built> {
        let path = &file.relative;
        let text = fs::read_to_string(&file.path).map_err(|err| BuildError::io(&file.path, err))?;

        let extracted = extract_frontmatter(&text).map_err(|source| BuildError::Frontmatter {
            path: path.clone(),
            source,
        })?;
        let meta = self
            .schema
            .validate(&extracted.fields, slug_stem(&file.path))
            .map_err(|source| BuildError::Validation {
                path: path.clone(),
                source,
            })?;

        let processed = self
            .processor
            .process(extracted.body, file.kind)
            .map_err(|source| BuildError::Process {
                path: path.clone(),
                source: locate(source, path, extracted.body_line_offset),
            })?;
        for warning in &processed.diagnostics.warnings {
            log::warn!("{}: {warning}", path.display());
        }

        let doc_dir = file.path.parent().unwrap_or(Path::new("."));
        let mut body = processed.body;
        let asset_error = |failure: assets::AssetFailure| BuildError::Asset {
            path: path.clone(),
            reference: failure.reference,
            message: failure.message,
        };
        assets::rewrite_tree(&mut body.children, store, doc_dir).map_err(asset_error)?;
        let image = match meta.image {
            Some(image) if assets::is_local_reference(&image) => {
                Some(assets::resolve(store, doc_dir, &image).map_err(asset_error)?)
            }
            other => other,
        };

        let permalink = format!("{}{}", self.config.content.permalink_prefix, meta.slug);
        let document = Document {
            title: meta.title,
            slug: meta.slug,
            date: meta.date,
            description: meta.description,
            draft: meta.draft,
            tags: meta.tags,
            excerpt: meta.excerpt.unwrap_or(processed.excerpt),
            image,
            compiled_body: body,
            permalink,
            headings: processed.headings,
            source_path: path.to_string_lossy().replace('\\', "/"),
        };
        log::debug!("built {} -> {}", path.display(), document.permalink);
        Ok(Built {
            document,
            warnings: processed.diagnostics.count(),
        })
    }
}

impl std::fmt::Debug for CollectionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionBuilder")
            .field("config", &self.config)
            .field("processor", &self.processor)
            .finish_non_exhaustive()
    }
}

/// File stem a slug is derived from; bundles (`posts/trip/index.md`) use
/// their directory name.
fn slug_stem(path: &Path) -> &str {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem != "index" {
        return stem;
    }
    path.parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or(stem)
}

/// Shifts body-relative locations past the front-matter and names the file.
fn locate(err: ProcessError, path: &Path, line_offset: usize) -> ProcessError {
    let ProcessError::Content(content) = err else {
        return err;
    };
    let shift = |mut location: inkpress_core::SourceLocation| {
        location = location.offset_lines(line_offset);
        location.file = Some(path.to_string_lossy().into_owned());
        location
    };
    ProcessError::Content(match content {
        ContentError::MarkdownAdapter { message, location } => ContentError::MarkdownAdapter {
            message,
            location: shift(location),
        },
        ContentError::Unsupported { construct, location } => ContentError::Unsupported {
            construct,
            location: shift(location),
        },
    })
}

/// Drafts included: a draft may not squat a published slug either.
fn check_unique_slugs(documents: &[Document], files: &[SourceFile]) -> Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(documents.len());
    for (i, doc) in documents.iter().enumerate() {
        if let Some(&first) = seen.get(doc.slug.as_str()) {
            return Err(BuildError::DuplicateSlug {
                slug: doc.slug.clone(),
                first: files[first].relative.clone(),
                second: files[i].relative.clone(),
            });
        }
        seen.insert(&doc.slug, i);
    }
    Ok(())
}

/// Empty sibling of `target`, removed on drop unless swapped in.
fn staging_dir(target: &Path) -> Result<TempDir> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|err| BuildError::io(parent, err))?;
    tempfile::Builder::new()
        .prefix(".inkpress-assets-")
        .tempdir_in(parent)
        .map_err(|err| BuildError::io(parent, err))
}

/// Replaces `target` with the staged directory.
fn swap_in(staging: TempDir, target: &Path) -> Result<()> {
    remove_dir(target)?;
    fs::rename(staging.path(), target).map_err(|err| BuildError::io(target, err))?;
    log::debug!("published assets to {}", target.display());
    Ok(())
}

fn remove_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            log::debug!("cleaned {}", dir.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(BuildError::io(dir, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundles_take_their_directory_name() {
        assert_eq!(slug_stem(Path::new("content/posts/alpine-trip/index.md")), "alpine-trip");
        assert_eq!(slug_stem(Path::new("content/posts/hello.mdx")), "hello");
        assert_eq!(slug_stem(Path::new("index.md")), "index");
    }

    #[test]
    fn swap_in_replaces_the_live_directory() {
        let root = tempfile::tempdir().unwrap();
        let live = root.path().join("public/static");
        fs::create_dir_all(&live).unwrap();
        fs::write(live.join("old.png"), b"old").unwrap();

        let staging = staging_dir(&live).unwrap();
        fs::write(staging.path().join("new.png"), b"new").unwrap();
        let staged = staging.path().to_path_buf();
        swap_in(staging, &live).unwrap();

        assert!(live.join("new.png").is_file());
        assert!(!live.join("old.png").exists());
        assert!(!staged.exists());
    }

    #[test]
    fn dropped_staging_leaves_the_live_directory_alone() {
        let root = tempfile::tempdir().unwrap();
        let live = root.path().join("static");
        fs::create_dir_all(&live).unwrap();
        fs::write(live.join("old.png"), b"old").unwrap();

        let staging = staging_dir(&live).unwrap();
        let staged = staging.path().to_path_buf();
        drop(staging);

        assert!(live.join("old.png").is_file());
        assert!(!staged.exists());
    }
}

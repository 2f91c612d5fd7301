use inkpress_collection::{BuildConfig, BuildError, BuildMode, CollectionBuilder, read_index, read_snapshot};
use inkpress_core::ContentError;
use inkpress_render::{ComponentTable, DiagramError, DiagramPolicy, DiagramRenderer, ProcessError, Processor, Runtime};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn svg_renderer(_language: &str, source: &str) -> Result<String, DiagramError> {
    Ok(format!("<svg><text>{source}</text></svg>"))
}

fn broken_renderer(_language: &str, _source: &str) -> Result<String, DiagramError> {
    Err(DiagramError::Invalid("unexpected token".into()))
}

fn builder(config: BuildConfig, renderer: fn(&str, &str) -> Result<String, DiagramError>) -> CollectionBuilder {
    let processor = Processor::with_diagram_renderer(&config.markdown, Arc::new(renderer) as Arc<dyn DiagramRenderer>);
    CollectionBuilder::new(config).with_processor(processor)
}

const HELLO: &str = "---
title: Hello World
date: 2024-01-15
tags: [rust, blog]
---
# Hello

First paragraph with **bold**.

{/* more */}

## Details

More text.
";

#[test]
fn builds_a_post_and_writes_the_snapshot() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/hello.mdx", HELLO);
    write(site.path(), "content/posts/notes.txt", "not a post");

    let output = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build_and_write()
        .unwrap();
    assert_eq!(output.stats.total, 1);
    assert_eq!(output.stats.published, 1);

    let doc = output.collection.get("hello").unwrap();
    assert_eq!(doc.title, "Hello World");
    assert_eq!(doc.permalink, "/blog/hello");
    assert_eq!(doc.tags, ["rust", "blog"]);
    assert_eq!(doc.excerpt, "First paragraph with bold.");
    assert_eq!(doc.source_path, "posts/hello.mdx");
    assert_eq!(doc.headings.len(), 2);

    let html = Runtime::render(&doc.compiled_body, &ComponentTable::new())
        .unwrap()
        .to_html();
    assert!(html.contains("<h1 id=\"hello\">"), "{html}");
    assert!(html.contains("<strong>bold</strong>"), "{html}");
    assert!(!html.contains("more"), "{html}");

    let data = site.path().join(".inkpress");
    assert_eq!(read_index(&data).unwrap().posts, 1);
    let back = read_snapshot(&data, "posts").unwrap();
    assert_eq!(back.all(), output.collection.all());

    let json = fs::read_to_string(data.join("posts.json")).unwrap();
    assert!(json.contains("\"date\": \"2024-01-15T00:00:00.000Z\""), "{json}");
    assert!(json.contains("\"compiledBody\""), "{json}");
}

#[test]
fn drafts_depend_on_the_build_mode() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/live.md", "---\ntitle: Live\ndate: 2024-01-01\n---\nBody\n");
    write(
        site.path(),
        "content/posts/wip.md",
        "---\ntitle: WIP\ndate: 2024-01-02\ndraft: true\n---\nBody\n",
    );

    let mut config = BuildConfig::rooted_at(site.path());
    config.build.threads = Some(2);
    let production = builder(config.clone(), svg_renderer).build().unwrap();
    assert_eq!(production.stats.total, 2);
    assert_eq!(production.stats.dropped, 1);
    assert!(production.collection.get("wip").is_none());

    config.build.mode = BuildMode::Development;
    let development = builder(config, svg_renderer).build().unwrap();
    assert_eq!(development.collection.len(), 2);
    assert!(development.collection.get("wip").unwrap().draft);
}

#[test]
fn duplicate_slugs_name_both_files() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/a.md", "---\ntitle: A\ndate: 2024-01-01\nslug: same\n---\nA\n");
    write(
        site.path(),
        "content/posts/b.md",
        "---\ntitle: B\ndate: 2024-01-02\nslug: same\ndraft: true\n---\nB\n",
    );

    let err = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build()
        .unwrap_err();
    let BuildError::DuplicateSlug { slug, first, second } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(slug, "same");
    assert_eq!(first, Path::new("posts/a.md"));
    assert_eq!(second, Path::new("posts/b.md"));
    assert_eq!(err.to_string(), "duplicate slug `same` in `posts/a.md` and `posts/b.md`");
}

#[test]
fn invalid_front_matter_names_file_and_field() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/valid.md", "---\ntitle: Valid\ndate: 2024-01-01\n---\nFine\n");
    write(site.path(), "content/posts/untitled.md", "---\ndate: 2024-01-01\n---\nBody\n");

    let err = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build()
        .unwrap_err();
    let BuildError::Validation { path, source } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(path, Path::new("posts/untitled.md"));
    assert_eq!(source.field, "title");
    assert_eq!(err.source_path(), Some(Path::new("posts/untitled.md")));
}

#[test]
fn body_errors_point_into_the_source_file() {
    let site = tempfile::tempdir().unwrap();
    write(
        site.path(),
        "content/posts/expr.mdx",
        "---\ntitle: Expr\ndate: 2024-01-01\n---\nHello\n\n{1 + 1}\n",
    );

    let err = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build()
        .unwrap_err();
    let BuildError::Process {
        source: ProcessError::Content(ContentError::Unsupported { location, .. }),
        ..
    } = &err
    else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(location.line, 7);
    assert_eq!(location.file.as_deref(), Some("posts/expr.mdx"));
}

const DIAGRAM: &str = "---
title: Flow
date: 2024-01-01
---
```mermaid
graph TD
```
";

#[test]
fn failing_diagrams_degrade_by_default() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/flow.md", DIAGRAM);

    let output = builder(BuildConfig::rooted_at(site.path()), broken_renderer)
        .build()
        .unwrap();
    assert_eq!(output.stats.warnings, 1);
    let doc = output.collection.get("flow").unwrap();
    let html = Runtime::render(&doc.compiled_body, &ComponentTable::new())
        .unwrap()
        .to_html();
    assert!(html.contains("data-diagram-error"), "{html}");
    assert!(html.contains("graph TD"), "{html}");
}

#[test]
fn failing_diagrams_abort_when_fatal() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/flow.md", DIAGRAM);

    let mut config = BuildConfig::rooted_at(site.path());
    config.markdown.diagram_policy = DiagramPolicy::Fatal;
    let err = builder(config, broken_renderer).build().unwrap_err();
    assert!(matches!(err, BuildError::Process { .. }), "{err}");
    assert_eq!(err.source_path(), Some(Path::new("posts/flow.md")));
}

#[test]
fn rendered_diagrams_are_inlined() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/flow.md", DIAGRAM);

    let output = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build()
        .unwrap();
    assert_eq!(output.stats.warnings, 0);
    let html = Runtime::render(&output.collection.all()[0].compiled_body, &ComponentTable::new())
        .unwrap()
        .to_html();
    assert!(html.contains("data-diagram=\"mermaid\""), "{html}");
    assert!(html.contains("<svg"), "{html}");
}

#[test]
fn local_assets_are_hashed_and_rewritten() {
    let site = tempfile::tempdir().unwrap();
    write(
        site.path(),
        "content/posts/trip/index.md",
        "---\ntitle: Trip\ndate: 2024-05-01\nslug: trip\nimage: ./cover.png\n---\n![Cover](./cover.png)\n\n[notes](./notes.pdf) and [next](../other.md)\n",
    );
    write(site.path(), "content/posts/trip/cover.png", "png bytes");
    write(site.path(), "content/posts/trip/notes.pdf", "pdf bytes");

    let output = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build()
        .unwrap();
    assert_eq!(output.stats.assets, 2);

    let doc = output.collection.get("trip").unwrap();
    let image = doc.image.as_deref().unwrap();
    assert!(image.starts_with("/static/cover-") && image.ends_with(".png"), "{image}");
    let published = site.path().join("public/static").join(&image["/static/".len()..]);
    assert_eq!(fs::read_to_string(published).unwrap(), "png bytes");

    let html = Runtime::render(&doc.compiled_body, &ComponentTable::new())
        .unwrap()
        .to_html();
    assert!(html.contains(&format!("src=\"{image}\"")), "{html}");
    assert!(html.contains("href=\"/static/notes-"), "{html}");
    assert!(html.contains("href=\"../other.md\""), "{html}");
}

#[test]
fn bundles_without_a_slug_use_their_directory() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/alpine-trip/index.md", "---\ntitle: Alps\ndate: 2024-05-01\n---\nA\n");
    write(site.path(), "content/posts/coast-trip/index.md", "---\ntitle: Coast\ndate: 2024-06-01\n---\nB\n");

    let output = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build()
        .unwrap();
    assert_eq!(output.collection.get("alpine-trip").unwrap().title, "Alps");
    assert_eq!(output.collection.get("coast-trip").unwrap().permalink, "/blog/coast-trip");
}

#[test]
fn failed_rebuild_keeps_published_assets() {
    let site = tempfile::tempdir().unwrap();
    let post = "content/posts/trip/index.md";
    write(
        site.path(),
        post,
        "---\ntitle: Trip\ndate: 2024-05-01\n---\n![Cover](./cover.png)\n",
    );
    write(site.path(), "content/posts/trip/cover.png", "png bytes");
    let config = BuildConfig::rooted_at(site.path());
    let data = config.data_dir();

    builder(config.clone(), svg_renderer).build_and_write().unwrap();
    let doc = read_snapshot(&data, "posts").unwrap().get("trip").unwrap().clone();
    let html = Runtime::render(&doc.compiled_body, &ComponentTable::new())
        .unwrap()
        .to_html();
    let start = html.find("/static/cover-").unwrap();
    let end = start + html[start..].find('"').unwrap();
    let published = site.path().join("public").join(&html[start + 1..end]);
    assert!(published.is_file(), "{}", published.display());

    write(site.path(), post, "---\ndate: 2024-05-01\n---\n![Cover](./cover.png)\n");
    let err = builder(config, svg_renderer).build_and_write().unwrap_err();
    assert!(matches!(err, BuildError::Validation { .. }), "{err}");

    assert_eq!(fs::read_to_string(&published).unwrap(), "png bytes");
    assert!(read_snapshot(&data, "posts").unwrap().get("trip").is_some());
    let leftovers: Vec<_> = fs::read_dir(site.path().join("public"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, ["static"]);
}

#[test]
fn clean_rebuild_drops_stale_assets() {
    let site = tempfile::tempdir().unwrap();
    let post = "content/posts/trip/index.md";
    write(site.path(), post, "---\ntitle: Trip\ndate: 2024-05-01\n---\n![Cover](./cover.png)\n");
    write(site.path(), "content/posts/trip/cover.png", "first");
    let config = BuildConfig::rooted_at(site.path());
    builder(config.clone(), svg_renderer).build().unwrap();

    write(site.path(), "content/posts/trip/cover.png", "second");
    builder(config.clone(), svg_renderer).build().unwrap();

    let published: Vec<_> = fs::read_dir(config.assets_dir())
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    assert_eq!(published, ["second"]);
}

#[test]
fn missing_assets_fail_the_document() {
    let site = tempfile::tempdir().unwrap();
    write(
        site.path(),
        "content/posts/broken.md",
        "---\ntitle: Broken\ndate: 2024-05-01\n---\n![gone](./gone.png)\n",
    );

    let err = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build()
        .unwrap_err();
    let BuildError::Asset { path, reference, .. } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(path, Path::new("posts/broken.md"));
    assert_eq!(reference, "./gone.png");
}

#[test]
fn empty_content_root_builds_an_empty_collection() {
    let site = tempfile::tempdir().unwrap();
    let output = builder(BuildConfig::rooted_at(site.path()), svg_renderer)
        .build()
        .unwrap();
    assert!(output.collection.is_empty());
    assert_eq!(output.stats.total, 0);
}

#[test]
fn snapshot_renders_with_typography() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "content/posts/hello.mdx", HELLO);
    let config = BuildConfig::rooted_at(site.path());
    let data = config.data_dir();
    builder(config, svg_renderer).build_and_write().unwrap();

    let collection = read_snapshot(&data, "posts").unwrap();
    let doc = collection.get("hello").unwrap();
    let html = Runtime::render(&doc.compiled_body, &ComponentTable::typography())
        .unwrap()
        .to_html();
    assert!(html.contains("<h1 class=\""), "{html}");
    assert!(html.contains("id=\"hello\""), "{html}");
    assert!(html.contains("<p class=\""), "{html}");
}

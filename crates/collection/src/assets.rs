//! Content-addressed asset extraction.
//!
//! Local files referenced by a post are copied under the asset directory
//! with a content hash in their name and the reference is rewritten to the
//! public URL.

use inkpress_render::tree::{Element, Node, visit_elements_mut};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Extensions that point at other posts, never at assets.
const DOCUMENT_EXTENSIONS: [&str; 3] = ["md", "mdx", "html"];

/// Writes hashed copies of local assets. Shared by all build workers.
#[derive(Debug)]
pub struct AssetStore {
    dir: PathBuf,
    base: String,
    template: String,
    published: Mutex<HashMap<PathBuf, String>>,
}

impl AssetStore {
    /// Assets go to `dir` and are served under `base`, named by `template`.
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>, template: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self {
            dir: dir.into(),
            base,
            template: template.into(),
            published: Mutex::new(HashMap::new()),
        }
    }

    /// Copies `source` into the asset directory (once per source path) and
    /// returns its public URL.
    pub fn publish(&self, source: &Path) -> io::Result<String> {
        if let Some(url) = self.published.lock().get(source) {
            return Ok(url.clone());
        }

        let bytes = fs::read(source)?;
        let hash = blake3::hash(&bytes);
        let file_name = hashed_name(&self.template, source, &hex::encode(hash.as_bytes()));
        let target = self.dir.join(&file_name);
        if !target.exists() {
            let dir = target.parent().unwrap_or(&self.dir);
            fs::create_dir_all(dir)?;
            write_atomically(dir, &target, &bytes)?;
            log::debug!("asset {} -> {}", source.display(), target.display());
        }

        let url = format!("{}{}", self.base, file_name);
        self.published.lock().insert(source.to_path_buf(), url.clone());
        Ok(url)
    }

    /// Number of distinct source files published so far.
    pub fn count(&self) -> usize {
        self.published.lock().len()
    }
}

/// Temp file plus rename. Equal names mean equal content, so losing a
/// rename race to another worker still leaves the right file.
fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    match temp.persist(target) {
        Ok(_) => Ok(()),
        Err(_) if target.exists() => Ok(()),
        Err(err) => Err(err.error),
    }
}

/// Expands `[name]`, `[ext]`, `[hash]` and `[hash:N]`.
pub fn hashed_name(template: &str, source: &Path, hash: &str) -> String {
    let name = source.file_stem().and_then(|s| s.to_str()).unwrap_or("asset");
    let ext = source.extension().and_then(|s| s.to_str()).unwrap_or("");

    let mut out = String::with_capacity(template.len() + hash.len());
    let mut rest = template;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find(']') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let token = &rest[open + 1..open + close];
        match token {
            "name" => out.push_str(name),
            "ext" => out.push_str(ext),
            "hash" => out.push_str(hash),
            _ => match token.strip_prefix("hash:").and_then(|n| n.parse::<usize>().ok()) {
                Some(len) => out.push_str(&hash[..len.min(hash.len())]),
                None => out.push_str(&rest[open..=open + close]),
            },
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    if ext.is_empty() {
        // `name-abc123.` reads badly
        if let Some(trimmed) = out.strip_suffix('.') {
            return trimmed.to_string();
        }
    }
    out
}

/// Whether `reference` names a file next to the document.
pub fn is_local_reference(reference: &str) -> bool {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with(['/', '#', '?']) {
        return false;
    }
    // Any scheme (`https:`, `mailto:`, `data:`) before the first slash.
    let head = reference.split('/').next().unwrap_or(reference);
    !head.contains(':')
}

fn strip_query(reference: &str) -> &str {
    reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
}

fn is_document_link(reference: &str) -> bool {
    let path = Path::new(strip_query(reference));
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => DOCUMENT_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)),
        None => true,
    }
}

/// A reference that could not be published.
#[derive(Debug)]
pub struct AssetFailure {
    /// Reference as written.
    pub reference: String,
    /// What went wrong.
    pub message: String,
}

/// Publishes `reference` relative to `doc_dir`.
pub fn resolve(store: &AssetStore, doc_dir: &Path, reference: &str) -> Result<String, AssetFailure> {
    let path = doc_dir.join(strip_query(reference));
    if !path.is_file() {
        return Err(AssetFailure {
            reference: reference.to_string(),
            message: format!("file not found at {}", path.display()),
        });
    }
    store.publish(&path).map_err(|err| AssetFailure {
        reference: reference.to_string(),
        message: err.to_string(),
    })
}

/// Rewrites `img[src]`, `source[src]` and file links in `a[href]`.
/// Returns the number of rewritten references.
pub fn rewrite_tree(nodes: &mut [Node], store: &AssetStore, doc_dir: &Path) -> Result<usize, AssetFailure> {
    let mut rewritten = 0;
    let mut failure = None;
    visit_elements_mut(nodes, &mut |el: &mut Element| {
        if failure.is_some() {
            return;
        }
        let attr = match el.tag.as_str() {
            "img" | "source" => "src",
            "a" => "href",
            _ => return,
        };
        let Some(reference) = el
            .prop(attr)
            .filter(|r| is_local_reference(r))
            .map(str::to_string)
        else {
            return;
        };
        if attr == "href" && is_document_link(&reference) {
            return;
        }
        match resolve(store, doc_dir, &reference) {
            Ok(url) => {
                el.set_prop(attr, url);
                rewritten += 1;
            }
            Err(err) => failure = Some(err),
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(rewritten),
    }
}

//! `inkpress watch`: rebuild the collection when content or config changes.
//!
//! File events are debounced on the event-loop thread. Each settled batch
//! triggers a rebuild on a worker thread through a [`RebuildGate`], so at
//! most one build runs and bursts of changes fold into a single follow-up.
//! Successful builds are written to disk and published to a
//! [`CollectionHandle`].

use anyhow::{Context, Result};
use inkpress_collection::{BuildConfig, BuildMode, CollectionBuilder, CollectionHandle, RebuildGate};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const DEBOUNCE_MS: u64 = 300;

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bak" | "swp" | "swo" | "tmp") || name.ends_with('~') || name.starts_with(".#")
}

/// Batches rapid file events.
#[derive(Default)]
struct Debouncer {
    pending: HashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn add(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        let before = self.pending.len();
        self.pending.extend(paths.into_iter().filter(|p| !is_temp_file(p)));
        if self.pending.len() > before {
            self.last_event = Some(Instant::now());
        }
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

/// Everything a rebuild needs, shared with worker threads.
struct Session {
    config_path: PathBuf,
    mode: BuildMode,
    builder: Mutex<Arc<CollectionBuilder>>,
    handle: CollectionHandle,
    gate: RebuildGate,
}

impl Session {
    fn rebuild(&self) {
        let builder = Arc::clone(&self.builder.lock());
        match builder.build_and_write() {
            Ok(output) => {
                let previous = self.handle.load().map_or(0, |c| c.len());
                let current = self.handle.publish(output.collection);
                log::info!("published {} documents (was {previous})", current.len());
            }
            Err(err) => match err.source_path() {
                Some(path) => log::error!("build failed in {}: {err}", path.display()),
                None => log::error!("build failed: {err}"),
            },
        }
    }

    /// Re-reads the config file; keeps the old builder if it is invalid.
    fn reload_config(&self) {
        match load(&self.config_path, self.mode) {
            Ok(config) => {
                *self.builder.lock() = Arc::new(CollectionBuilder::new(config));
                log::info!("reloaded {}", self.config_path.display());
            }
            Err(err) => log::error!("keeping previous config: {err:#}"),
        }
    }
}

fn load(config_path: &Path, mode: BuildMode) -> Result<BuildConfig> {
    Ok(incremental(BuildConfig::load(config_path)?, mode))
}

/// Rebuilds write over the previous output instead of wiping it.
fn incremental(mut config: BuildConfig, mode: BuildMode) -> BuildConfig {
    config.build.mode = mode;
    config.output.clean = false;
    config
}

/// Builds once, then watches until the watcher shuts down.
pub fn watch(config: BuildConfig, config_path: PathBuf) -> Result<()> {
    let mode = config.build.mode;
    let config = incremental(config, mode);
    let content_root = config.content_root();
    // notify reports absolute paths
    let config_path = config_path.canonicalize().unwrap_or(config_path);
    let session = Arc::new(Session {
        config_path,
        mode,
        builder: Mutex::new(Arc::new(CollectionBuilder::new(config))),
        handle: CollectionHandle::new(),
        gate: RebuildGate::new(),
    });

    session.gate.trigger(|| session.rebuild());

    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        tx.send(res).ok();
    })
    .context("failed to create file watcher")?;
    watcher
        .watch(&content_root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", content_root.display()))?;
    if session.config_path.exists() {
        watcher
            .watch(&session.config_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", session.config_path.display()))?;
    }
    log::info!("watching {} for changes", content_root.display());

    let mut debouncer = Debouncer::default();
    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event.kind) => debouncer.add(event.paths),
            Ok(Ok(_)) => {}
            Ok(Err(err)) => log::warn!("watch error: {err}"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if debouncer.ready() {
            let changed = debouncer.take();
            if changed.contains(&session.config_path) {
                session.reload_config();
            }
            log::info!("{} path(s) changed, rebuilding", changed.len());
            log::debug!("changed: {changed:?}");
            let session = Arc::clone(&session);
            thread::spawn(move || {
                session.gate.trigger(|| session.rebuild());
            });
        }
    }
    Ok(())
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_files_are_ignored() {
        assert!(is_temp_file(Path::new("posts/a.md~")));
        assert!(is_temp_file(Path::new("posts/.a.md.swp")));
        assert!(is_temp_file(Path::new("posts/.#a.md")));
        assert!(!is_temp_file(Path::new("posts/a.md")));
    }

    #[test]
    fn debouncer_waits_for_quiet() {
        let mut debouncer = Debouncer::default();
        assert!(!debouncer.ready());
        debouncer.add([PathBuf::from("a.md"), PathBuf::from("a.md~"), PathBuf::from("b.md")]);
        assert!(!debouncer.ready());
        debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS));
        assert!(debouncer.ready());
        let mut taken = debouncer.take();
        taken.sort();
        assert_eq!(taken, [PathBuf::from("a.md"), PathBuf::from("b.md")]);
        assert!(!debouncer.ready());
    }

    #[test]
    fn watch_builds_never_clean_the_output() {
        let root = tempfile::tempdir().unwrap();
        let config_path = root.path().join("inkpress.toml");
        std::fs::write(&config_path, "[output]\nclean = true\n").unwrap();

        let loaded = load(&config_path, BuildMode::Development).unwrap();
        assert!(!loaded.output.clean);
        assert_eq!(loaded.build.mode, BuildMode::Development);

        let defaults = incremental(BuildConfig::rooted_at(root.path()), BuildMode::Production);
        assert!(!defaults.output.clean);
    }

    #[test]
    fn only_content_events_count() {
        use notify::event::{AccessKind, CreateKind};
        assert!(is_relevant(&EventKind::Create(CreateKind::File)));
        assert!(!is_relevant(&EventKind::Access(AccessKind::Any)));
    }
}

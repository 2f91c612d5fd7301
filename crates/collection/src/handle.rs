//! Atomic publication of built collections.

use crate::collection::Collection;
use crate::error::Result;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::Arc;

/// Holds the current collection. Readers get a consistent snapshot; a
/// rebuild replaces the whole collection at once.
#[derive(Debug, Default)]
pub struct CollectionHandle {
    current: ArcSwapOption<Collection>,
    built: Mutex<bool>,
}

impl CollectionHandle {
    /// An empty handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current collection, if one has been published.
    pub fn load(&self) -> Option<Arc<Collection>> {
        self.current.load_full()
    }

    /// Replaces the current collection.
    pub fn publish(&self, collection: Collection) -> Arc<Collection> {
        let collection = Arc::new(collection);
        self.current.store(Some(Arc::clone(&collection)));
        *self.built.lock() = true;
        collection
    }

    /// Runs `build` the first time it is called on this handle (or until a
    /// build succeeds) and returns the current collection. Concurrent callers
    /// wait for the first build instead of starting their own.
    pub fn ensure_built<F>(&self, build: F) -> Result<Arc<Collection>>
    where
        F: FnOnce() -> Result<Collection>,
    {
        let mut built = self.built.lock();
        if *built && let Some(current) = self.current.load_full() {
            return Ok(current);
        }
        let collection = Arc::new(build()?);
        self.current.store(Some(Arc::clone(&collection)));
        *built = true;
        Ok(collection)
    }

    /// Whether a collection has been built or published.
    pub fn is_built(&self) -> bool {
        *self.built.lock()
    }
}

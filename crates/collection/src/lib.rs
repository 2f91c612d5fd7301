#![deny(missing_docs)]
//! inkpress collection builder.
//!
//! Discovers post sources, builds each one in parallel (front-matter, schema,
//! body pipeline, assets), rejects duplicate slugs, runs the `prepare` hook
//! and freezes the result as a [`Collection`]. One-shot builds also write a
//! JSON snapshot; watch mode republishes through a [`CollectionHandle`].

pub mod assets;
pub mod builder;
pub mod collection;
pub mod config;
pub mod discover;
/// Built documents.
pub mod document;
pub mod error;
pub mod gate;
pub mod handle;
pub mod snapshot;

pub use assets::AssetStore;
pub use builder::{BuildOutput, BuildStats, CollectionBuilder};
pub use collection::{Collection, DropDraftsInProduction, PrepareContext, PrepareHook};
pub use config::{BuildConfig, BuildMode, CONFIG_FILE, ConfigError};
pub use discover::{SourceFile, discover};
pub use document::Document;
pub use error::{BuildError, Result};
pub use gate::RebuildGate;
pub use handle::CollectionHandle;
pub use snapshot::{SnapshotIndex, read_index, read_snapshot, write_snapshot};

//! Durable build output: `<data>/<collection>.json` and `<data>/index.json`.

use crate::collection::Collection;
use crate::document::Document;
use crate::error::{BuildError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Summary file name.
pub const INDEX_FILE: &str = "index.json";

/// Contents of `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotIndex {
    /// Number of documents written.
    pub posts: usize,
    /// Build time, RFC 3339.
    pub built_at: String,
}

/// Path of the collection file inside `data_dir`.
pub fn collection_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.json"))
}

/// Writes the collection and the index, returning the collection file path.
pub fn write_snapshot(collection: &Collection, data_dir: &Path, built_at: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(data_dir).map_err(|err| BuildError::io(data_dir, err))?;

    let path = collection_path(data_dir, collection.name());
    let json = serde_json::to_string_pretty(collection.all())?;
    fs::write(&path, json).map_err(|err| BuildError::io(&path, err))?;

    let index = SnapshotIndex {
        posts: collection.len(),
        built_at: built_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let index_path = data_dir.join(INDEX_FILE);
    fs::write(&index_path, serde_json::to_string_pretty(&index)?)
        .map_err(|err| BuildError::io(&index_path, err))?;

    log::debug!("snapshot written to {}", path.display());
    Ok(path)
}

/// Reads a collection written by [`write_snapshot`].
pub fn read_snapshot(data_dir: &Path, name: &str) -> Result<Collection> {
    let path = collection_path(data_dir, name);
    let json = fs::read_to_string(&path).map_err(|err| BuildError::io(&path, err))?;
    let documents: Vec<Document> = serde_json::from_str(&json)?;
    Ok(Collection::new(name, documents))
}

/// Reads `index.json`.
pub fn read_index(data_dir: &Path) -> Result<SnapshotIndex> {
    let path = data_dir.join(INDEX_FILE);
    let json = fs::read_to_string(&path).map_err(|err| BuildError::io(&path, err))?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::tests::doc;
    use chrono::TimeZone;

    #[test]
    fn written_snapshot_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let collection = Collection::new("posts", vec![doc("first", 1, false, &["a"]), doc("second", 2, true, &[])]);
        let built_at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();

        let path = write_snapshot(&collection, dir.path(), built_at).unwrap();
        assert_eq!(path, dir.path().join("posts.json"));

        let back = read_snapshot(dir.path(), "posts").unwrap();
        assert_eq!(back.all(), collection.all());
        assert_eq!(
            read_index(dir.path()).unwrap(),
            SnapshotIndex {
                posts: 2,
                built_at: "2024-02-01T12:00:00.000Z".into()
            }
        );
    }

    #[test]
    fn missing_snapshot_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_snapshot(dir.path(), "posts"), Err(BuildError::Io { .. })));
    }
}

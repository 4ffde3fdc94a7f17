use std::path::PathBuf;

use crate::error::Error;

/// Private document storage. Paths returned by `put` are storage-relative and
/// are never handed to clients directly; access goes through signed URLs.
pub trait DocumentStore {
    /// Writes `name` under `folder`, overwriting any existing object at the
    /// same path, and returns the storage path.
    fn put(&self, folder: &str, name: &str, bytes: &[u8]) -> Result<String, Error>;
    /// Maps a storage path back to a servable file.
    fn resolve(&self, path: &str) -> Result<PathBuf, Error>;
}

pub mod sign;

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::ports::storage::DocumentStore;
use crate::error::Error;

fn check_segment(segment: &str) -> Result<(), Error> {
    if segment.is_empty() || segment.contains('/') || segment.contains('\\') || segment.contains("..") {
        return Err(Error::Validation(format!("invalid storage path segment: {}", segment)));
    }
    Ok(())
}

/// Filesystem-backed document store rooted at one directory. Paths handed out
/// are `<folder>/<name>` relative to the root.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentStore for LocalStore {
    fn put(&self, folder: &str, name: &str, bytes: &[u8]) -> Result<String, Error> {
        check_segment(folder)?;
        check_segment(name)?;
        let dir = self.root.join(folder);
        create_dir_all(&dir)?;
        let mut file = File::create(dir.join(name))?;
        file.write_all(bytes)?;
        Ok(format!("{}/{}", folder, name))
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
        for segment in path.split('/') {
            check_segment(segment)?;
        }
        let full = self.root.join(Path::new(path));
        if !full.is_file() {
            return Err(Error::NotFound(format!("document {}", path)));
        }
        Ok(full)
    }
}

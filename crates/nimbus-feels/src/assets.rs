//! Where bundled model assets are read from.

use std::path::{Path, PathBuf};

/// Read-only access to bundled files, read once at initialization.
pub trait AssetSource: Send + Sync {
    fn read(&self, name: &str) -> std::io::Result<Vec<u8>>;
}

/// Assets stored as plain files under one directory.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirAssets {
    fn read(&self, name: &str) -> std::io::Result<Vec<u8>> {
        let path = self.root.join(name);
        tracing::debug!("Reading asset {}", path.display());
        std::fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("names.txt"), "a\nb\n").unwrap();

        let assets = DirAssets::new(dir.path());
        assert_eq!(assets.read("names.txt").unwrap(), b"a\nb\n");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirAssets::new(dir.path()).read("model.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}

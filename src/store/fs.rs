use anyhow::{Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::repo::Store;

/// Store backed by one directory; keys are file names under the root.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| anyhow!("cannot create store directory {}: {e}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl Store for FsStore {
    fn exists(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, bytes).map_err(|e| anyhow!("cannot write {}: {e}", path.display()))
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key);
        fs::read(&path).map_err(|e| anyhow!("cannot read {}: {e}", path.display()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                keys.push(name.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

//! Directory-backed cache store

use super::{CacheKey, CacheStore};
use crate::error::CacheError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One directory per source, one file per key
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for `key`; rejects names that would escape the directory
    pub fn path_for(&self, key: &CacheKey) -> Result<PathBuf, CacheError> {
        let name = key.file_name();
        if name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    fn put(&self, key: &CacheKey, body: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        lhx_common::fs::write_atomic(&path, body.as_bytes()).map_err(|e| match e {
            lhx_common::Error::Io(source) => CacheError::Io {
                path: path.clone(),
                source,
            },
            other => CacheError::Io {
                path: path.clone(),
                source: std::io::Error::new(ErrorKind::Other, other.to_string()),
            },
        })
    }

    fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.path_for(key)?.is_file())
    }
}

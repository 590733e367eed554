//! Local filesystem backend
//!
//! Store type `FS`. The session root comes from the store parameter `root`,
//! else `{PROFILE}_FSB_ROOT_PATH`, else `FSB_ROOT_PATH`.

use cc_model::{
    clean_path, join_root, ByteStream, Connector, DataStore, FileHierarchy, Session, StoreError, StoreInstance,
    StoreReader, StoreWriter,
};
use std::any::Any;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

/// Store-type identifier of the filesystem backend
pub const FS_STORE_TYPE: &str = "FS";

const ROOT_ENV: &str = "FSB_ROOT_PATH";

/// Filesystem store instance
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    fn resolve_root(store: &DataStore) -> Result<String, StoreError> {
        if let Some(root) = store.params.get_str("root") {
            return Ok(root.to_string());
        }
        if let Some(profile) = store.profile.as_deref() {
            if let Some(root) = non_empty_env(&format!("{profile}_{ROOT_ENV}")) {
                return Ok(root);
            }
        }
        non_empty_env(ROOT_ENV).ok_or_else(|| {
            StoreError::Connection(format!("store {}: no root parameter and {ROOT_ENV} is not set", store.name))
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl StoreInstance for FsStore {
    fn connector(&self) -> Option<&dyn Connector> {
        Some(self)
    }
}

impl Connector for FsStore {
    fn connect(&self, store: &DataStore) -> Result<Arc<dyn Session>, StoreError> {
        let root = Self::resolve_root(store)?;
        if !Path::new(&root).is_dir() {
            return Err(StoreError::Connection(format!("root {root} is not a directory")));
        }
        tracing::debug!(store = %store.name, %root, "opened filesystem session");
        Ok(Arc::new(FsSession::new(root)))
    }
}

/// Session rooted at a local directory
///
/// Reader and writer paths are relative to the root; file-hierarchy paths
/// are absolute.
#[derive(Debug, Clone)]
pub struct FsSession {
    root: String,
}

impl FsSession {
    /// Create session rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: clean_path(&root.into()),
        }
    }

    /// Session root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    fn open(path: &str) -> Result<ByteStream, StoreError> {
        match File::open(path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::ObjectNotFound(path.to_string())),
            Err(e) => Err(StoreError::io_error(path, e)),
        }
    }

    fn write(source: &mut dyn Read, path: &str) -> Result<u64, StoreError> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io_error(path, e))?;
        }
        let mut file = File::create(path).map_err(|e| StoreError::io_error(path, e))?;
        io::copy(source, &mut file).map_err(|e| StoreError::io_error(path, e))
    }

    fn reject_data_path(data_path: Option<&str>) -> Result<(), StoreError> {
        match data_path {
            Some(dp) => Err(StoreError::Unsupported(format!("data path {dp} on a filesystem store"))),
            None => Ok(()),
        }
    }
}

impl StoreReader for FsSession {
    fn get(&self, path: &str, data_path: Option<&str>) -> Result<ByteStream, StoreError> {
        Self::reject_data_path(data_path)?;
        Self::open(&join_root(&self.root, path))
    }
}

impl StoreWriter for FsSession {
    fn put(&self, source: &mut dyn Read, path: &str, data_path: Option<&str>) -> Result<u64, StoreError> {
        Self::reject_data_path(data_path)?;
        Self::write(source, &join_root(&self.root, path))
    }
}

impl FileHierarchy for FsSession {
    fn absolute_path(&self, relative: &str) -> String {
        join_root(&self.root, relative)
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(Path::new(path).is_file())
    }

    fn walk(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = Path::new(prefix);
        if !dir.is_dir() {
            return Err(StoreError::ObjectNotFound(prefix.to_string()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(|e| StoreError::io_error(prefix, e.into()))?;
            if entry.file_type().is_file() {
                files.push(entry.path().to_string_lossy().into_owned());
            }
        }
        files.sort();
        Ok(files)
    }

    fn get_object(&self, path: &str) -> Result<ByteStream, StoreError> {
        Self::open(path)
    }

    fn put_object(&self, source: &mut dyn Read, path: &str) -> Result<u64, StoreError> {
        Self::write(source, path)
    }
}

impl Session for FsSession {
    fn reader(&self) -> Option<&dyn StoreReader> {
        Some(self)
    }

    fn writer(&self) -> Option<&dyn StoreWriter> {
        Some(self)
    }

    fn file_hierarchy(&self) -> Option<&dyn FileHierarchy> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

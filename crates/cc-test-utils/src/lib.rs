//! Testing utilities for the CC plugin workspace
//!
//! In-memory store backend with switchable capabilities, plus payload and
//! environment fixtures.

#![allow(missing_docs)]

use cc_model::{
    join_root, Action, Attributes, ByteStream, Connector, DataSource, DataStore, FileHierarchy, IoManager, Payload,
    Session, StoreError, StoreInstance, StoreReader, StoreWriter,
};
use cc_store::StoreTypeRegistry;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::sync::Arc;

pub const MEMORY_STORE_TYPE: &str = "MEMORY";

/// Store parameter switching off the read capability when `false`
pub const READ_PARAM: &str = "read";
/// Store parameter switching off the write capability when `false`
pub const WRITE_PARAM: &str = "write";
/// Store parameter switching off the file-hierarchy capability when `false`
pub const FILES_PARAM: &str = "files";

#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStore;

impl StoreInstance for MemoryStore {
    fn connector(&self) -> Option<&dyn Connector> {
        Some(self)
    }
}

impl Connector for MemoryStore {
    fn connect(&self, store: &DataStore) -> Result<Arc<dyn Session>, StoreError> {
        let enabled = |param: &str| !matches!(store.params.get(param), Some(cc_model::AttrValue::Bool(false)));
        Ok(Arc::new(MemorySession {
            root: store.root(),
            readable: enabled(READ_PARAM),
            writable: enabled(WRITE_PARAM),
            files: enabled(FILES_PARAM),
            objects: Mutex::new(BTreeMap::new()),
        }))
    }
}

/// Session keeping objects in a map keyed by absolute path
#[derive(Debug)]
pub struct MemorySession {
    root: String,
    readable: bool,
    writable: bool,
    files: bool,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemorySession {
    fn key(&self, path: &str, data_path: Option<&str>) -> String {
        let absolute = join_root(&self.root, path);
        match data_path {
            Some(dp) => format!("{absolute}#{dp}"),
            None => absolute,
        }
    }

    /// Store bytes at a root-relative path
    pub fn seed(&self, path: &str, data_path: Option<&str>, bytes: impl Into<Vec<u8>>) {
        let key = self.key(path, data_path);
        self.objects.lock().insert(key, bytes.into());
    }

    /// Bytes at a root-relative path
    pub fn contents(&self, path: &str, data_path: Option<&str>) -> Option<Vec<u8>> {
        self.objects.lock().get(&self.key(path, data_path)).cloned()
    }

    /// Every stored key, sorted
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    fn read_key(&self, key: &str) -> Result<ByteStream, StoreError> {
        self.objects
            .lock()
            .get(key)
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as ByteStream)
            .ok_or_else(|| StoreError::ObjectNotFound(key.to_string()))
    }

    fn write_key(&self, source: &mut dyn Read, key: String) -> Result<u64, StoreError> {
        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|e| StoreError::io_error(&key, e))?;
        let written = bytes.len() as u64;
        self.objects.lock().insert(key, bytes);
        Ok(written)
    }
}

impl StoreReader for MemorySession {
    fn get(&self, path: &str, data_path: Option<&str>) -> Result<ByteStream, StoreError> {
        self.read_key(&self.key(path, data_path))
    }
}

impl StoreWriter for MemorySession {
    fn put(&self, source: &mut dyn Read, path: &str, data_path: Option<&str>) -> Result<u64, StoreError> {
        self.write_key(source, self.key(path, data_path))
    }
}

impl FileHierarchy for MemorySession {
    fn absolute_path(&self, relative: &str) -> String {
        join_root(&self.root, relative)
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.objects.lock().contains_key(path))
    }

    fn walk(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        let found: Vec<String> = self
            .objects
            .lock()
            .keys()
            .filter(|key| key.starts_with(&dir))
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(StoreError::ObjectNotFound(prefix.to_string()));
        }
        Ok(found)
    }

    fn get_object(&self, path: &str) -> Result<ByteStream, StoreError> {
        self.read_key(path)
    }

    fn put_object(&self, source: &mut dyn Read, path: &str) -> Result<u64, StoreError> {
        self.write_key(source, path.to_string())
    }
}

impl Session for MemorySession {
    fn reader(&self) -> Option<&dyn StoreReader> {
        self.readable.then_some(self as &dyn StoreReader)
    }

    fn writer(&self) -> Option<&dyn StoreWriter> {
        self.writable.then_some(self as &dyn StoreWriter)
    }

    fn file_hierarchy(&self) -> Option<&dyn FileHierarchy> {
        self.files.then_some(self as &dyn FileHierarchy)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Built-in store types plus `MEMORY`
pub fn memory_registry() -> StoreTypeRegistry {
    StoreTypeRegistry::with_defaults().with(MEMORY_STORE_TYPE, || Box::new(MemoryStore))
}

pub fn memory_store(name: &str) -> DataStore {
    DataStore::new(name, MEMORY_STORE_TYPE)
}

/// Memory store with the named capability parameters switched off
pub fn memory_store_without(name: &str, disabled: &[&str]) -> DataStore {
    let params = disabled
        .iter()
        .fold(Attributes::new(), |params, param| params.with(*param, false));
    memory_store(name).with_params(params)
}

/// Bound memory session of a connected store
///
/// # Panics
/// Panics if the store is not connected to a memory session.
pub fn memory_session(store: &DataStore) -> &MemorySession {
    store
        .session()
        .and_then(|session| session.as_any().downcast_ref::<MemorySession>())
        .expect("store is not connected to a memory session")
}

pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

/// Job with a memory store `FFRD`, one input and one output, and a single
/// `compute` action that adds its own output
pub fn sample_payload() -> Payload {
    let job = IoManager::new()
        .with_attributes(Attributes::new().with("scenario", "base").with("event", "{ENV::CC_EVENT_NUMBER}"))
        .with_store(memory_store("FFRD"))
        .with_input(DataSource::new("terrain", "FFRD").with_path("default", "{ATTR::scenario}/terrain.tif"))
        .with_output(DataSource::new("summary", "FFRD").with_path("default", "{ATTR::scenario}/summary.csv"));

    let compute = Action::new("compute")
        .with_type("compute")
        .with_description("runs the model")
        .with_io(
            IoManager::new()
                .with_attributes(Attributes::new().with("scenario", "alt"))
                .with_output(
                    DataSource::new("results", "FFRD")
                        .with_path("default", "{ATTR::scenario}/{ATTR::event}/results.csv")
                        .with_path("member", "{ATTR::scenario}/members/{VAR::member}.csv"),
                ),
        );

    Payload::new(job, vec![compute])
}

/// Environment matching [`sample_payload`]
pub fn sample_env() -> HashMap<String, String> {
    env(&[("CC_EVENT_NUMBER", "7")])
}

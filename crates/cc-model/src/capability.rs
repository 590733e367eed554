//! Store capability contracts
//!
//! Backends are never addressed by their declared type. Code that needs to
//! read, write or walk a store asks the bound [`Session`] for the matching
//! capability and fails with a capability mismatch when it is absent. A single
//! session may expose any subset of:
//!
//! - [`StoreReader`]: open a byte stream for a path
//! - [`StoreWriter`]: stream bytes into a path
//! - [`FileHierarchy`]: object/prefix semantics (exists, walk, get, put)
//!
//! Store construction goes through [`StoreInstance`], which may in turn expose
//! a [`Connector`] producing the session.

use crate::store::DataStore;
use std::any::Any;
use std::fmt::Debug;
use std::io::Read;
use std::sync::Arc;

/// Owned byte stream returned by read capabilities
pub type ByteStream = Box<dyn Read + Send>;

/// Errors surfaced by a backend's own connect/read/write
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Object or prefix does not exist in the backend
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// Backend rejected the connection parameters
    #[error("connection failed: {0}")]
    Connection(String),

    /// Operation not supported for this particular call (e.g. data paths on a
    /// flat file store)
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// IO error while talking to the backend
    #[error("io error on {path}: {source}")]
    Io {
        /// Path the backend was operating on
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Any other backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Read capability
pub trait StoreReader: Send + Sync {
    /// Open `path` (and optional secondary `data_path`) for reading
    fn get(&self, path: &str, data_path: Option<&str>) -> Result<ByteStream, StoreError>;
}

/// Write capability
pub trait StoreWriter: Send + Sync {
    /// Stream `source` into `path` (and optional secondary `data_path`),
    /// returning the number of bytes written
    fn put(
        &self,
        source: &mut dyn Read,
        path: &str,
        data_path: Option<&str>,
    ) -> Result<u64, StoreError>;
}

/// File-hierarchy capability
///
/// Paths handed to `exists`, `walk`, `get_object` and `put_object` are
/// absolute, i.e. already passed through [`FileHierarchy::absolute_path`].
pub trait FileHierarchy: Send + Sync {
    /// Resolve a store-relative path to the backend's absolute form
    fn absolute_path(&self, relative: &str) -> String;

    /// Whether a single object exists at `path`
    fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Recursively list every object below `prefix`
    fn walk(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Open a single object
    fn get_object(&self, path: &str) -> Result<ByteStream, StoreError>;

    /// Write a single object, returning bytes written
    fn put_object(&self, source: &mut dyn Read, path: &str) -> Result<u64, StoreError>;
}

/// Live backend handle bound to a [`DataStore`]
///
/// Every capability accessor defaults to `None`; backends override the ones
/// they support.
pub trait Session: Debug + Send + Sync + 'static {
    /// Read capability, if supported
    fn reader(&self) -> Option<&dyn StoreReader> {
        None
    }

    /// Write capability, if supported
    fn writer(&self) -> Option<&dyn StoreWriter> {
        None
    }

    /// File-hierarchy capability, if supported
    fn file_hierarchy(&self) -> Option<&dyn FileHierarchy> {
        None
    }

    /// Concrete session for typed access
    fn as_any(&self) -> &dyn Any;
}

/// Connect capability of a freshly constructed store instance
pub trait Connector: Send + Sync {
    /// Open a session using the store's declared parameters
    fn connect(&self, store: &DataStore) -> Result<Arc<dyn Session>, StoreError>;
}

/// Value produced by a store-type constructor
///
/// Stateless, path-only store types return `None` from [`connector`] and are
/// left without a session.
///
/// [`connector`]: StoreInstance::connector
pub trait StoreInstance: Send {
    /// Connect capability, if supported
    fn connector(&self) -> Option<&dyn Connector> {
        None
    }
}

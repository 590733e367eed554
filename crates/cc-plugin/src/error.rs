//! Error types for the plugin manager
//!
//! [`PluginError`] is the single error surfaced to plugin code. Lower layers
//! keep their own enums and convert in through `#[from]`.

use cc_model::{PayloadError, ResolveError, ScopeError, StoreError};
use cc_store::ConnectError;
use cc_template::SubstitutionError;
use std::fmt;
use std::path::PathBuf;

/// Result alias for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Error returned by an action runner
pub type RunnerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Session capability an operation requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// [`cc_model::StoreReader`]
    Read,
    /// [`cc_model::StoreWriter`]
    Write,
    /// [`cc_model::FileHierarchy`]
    FileHierarchy,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::FileHierarchy => "file hierarchy",
        })
    }
}

/// Plugin manager errors
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Store, data source, path key or data-path key not found
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Invalid scope chain
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Store session lacks the capability an operation needs
    #[error("data store {store} does not support {capability}")]
    CapabilityMismatch {
        /// Store name
        store: String,
        /// Missing capability
        capability: Capability,
    },

    /// Store session is not of the requested concrete type
    #[error("data store {store} ({store_type}) has no session of the requested type")]
    SessionType {
        /// Store name
        store: String,
        /// Declared store type
        store_type: String,
    },

    /// Template rewriting failed
    #[error("substitution failed: {0}")]
    Substitution(#[from] SubstitutionError),

    /// Backend read/write failed
    #[error("data store {store}: {source}")]
    Upstream {
        /// Store name
        store: String,
        /// Backend error
        #[source]
        source: StoreError,
    },

    /// Connect phase failed
    #[error("connect failed: {0}")]
    Connect(#[from] ConnectError),

    /// Runner failed and did not allow continuing
    #[error("error running {action}: {source}")]
    Dispatch {
        /// Action name
        action: String,
        /// Runner error
        #[source]
        source: RunnerError,
    },

    /// Runners that failed with continue-on-error set
    #[error("{} action(s) failed: {}", .0.len(), .0.join(", "))]
    ActionFailures(Vec<String>),

    /// Local filesystem error
    #[error("io error on {path}: {source}")]
    Io {
        /// Local path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Job descriptor could not be decoded
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),
}

impl PluginError {
    /// Create capability-mismatch error
    pub fn capability(store: impl Into<String>, capability: Capability) -> Self {
        Self::CapabilityMismatch {
            store: store.into(),
            capability,
        }
    }

    /// Create upstream error
    pub fn upstream(store: impl Into<String>, source: StoreError) -> Self {
        Self::Upstream {
            store: store.into(),
            source,
        }
    }

    /// Create local IO error
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if error is a missing-name resolution failure
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Resolve(_))
    }
}

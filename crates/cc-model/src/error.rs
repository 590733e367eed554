//! Error types for the data model
//!
//! Provides error handling for:
//! - Name resolution across the scope chain
//! - Scope-chain construction
//! - Payload decoding

use crate::source::IoType;
use std::path::PathBuf;

/// Errors while resolving a logical name
///
/// Only returned after the whole scope chain has been searched.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No store with this name in any scope
    #[error("invalid store name: {0}")]
    StoreNotFound(String),

    /// No data source with this name in the searched set(s)
    #[error("data source {name} not found ({io_type})")]
    DataSourceNotFound {
        /// Data-source name
        name: String,
        /// Set(s) that were searched
        io_type: IoType,
    },

    /// Data source exists but has no such path key
    #[error("data source {source_name} has no path named {key}")]
    PathKeyNotFound {
        /// Data-source name
        source_name: String,
        /// Missing path key
        key: String,
    },

    /// Data source exists but has no such data-path key
    #[error("data source {source_name} has no data path named {key}")]
    DataPathKeyNotFound {
        /// Data-source name
        source_name: String,
        /// Missing data-path key
        key: String,
    },
}

impl ResolveError {
    /// Create data-source-not-found error
    pub fn data_source(name: impl Into<String>, io_type: IoType) -> Self {
        Self::DataSourceNotFound {
            name: name.into(),
            io_type,
        }
    }

    /// Create path-key-not-found error
    pub fn path_key(source_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::PathKeyNotFound {
            source_name: source_name.into(),
            key: key.into(),
        }
    }

    /// Create data-path-key-not-found error
    pub fn data_path_key(source_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DataPathKeyNotFound {
            source_name: source_name.into(),
            key: key.into(),
        }
    }

    /// Name of the store or data source that could not be resolved
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::StoreNotFound(name) => name,
            Self::DataSourceNotFound { name, .. } => name,
            Self::PathKeyNotFound { source_name, .. }
            | Self::DataPathKeyNotFound { source_name, .. } => source_name,
        }
    }
}

/// Errors while building a scope chain
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Node is already part of the chain
    #[error("scope node would become its own ancestor")]
    Cycle,

    /// Child attached below an action-level scope
    #[error("scope chain too deep: action scopes must sit directly under the job scope (depth {depth})")]
    TooDeep {
        /// Depth of the chain the child was attached to
        depth: usize,
    },
}

/// Errors while decoding a job descriptor
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Malformed JSON descriptor
    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML descriptor
    #[error("invalid yaml payload: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error reading a descriptor file
    #[error("io error reading {path}: {source}")]
    Io {
        /// Descriptor path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl PayloadError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_display() {
        let err = ResolveError::StoreNotFound("FFRD".to_string());
        assert_eq!(err.to_string(), "invalid store name: FFRD");

        let err = ResolveError::data_source("terrain", IoType::Input);
        assert_eq!(err.to_string(), "data source terrain not found (input)");
    }

    #[test]
    fn resolve_error_carries_name() {
        assert_eq!(ResolveError::path_key("terrain", "default").name(), "terrain");
        assert_eq!(ResolveError::StoreNotFound("s".into()).name(), "s");
    }

    #[test]
    fn scope_error_display() {
        assert!(ScopeError::Cycle.to_string().contains("ancestor"));
        assert!(ScopeError::TooDeep { depth: 2 }.to_string().contains("depth 2"));
    }
}

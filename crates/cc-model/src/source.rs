//! Data sources
//!
//! A [`DataSource`] is a logical, named input or output bound to one store
//! through path templates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Which data-source set(s) of a scope a lookup searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IoType {
    /// Input set only
    #[serde(rename = "INPUT")]
    Input,
    /// Output set only
    #[serde(rename = "OUTPUT")]
    Output,
    /// Inputs, then outputs
    #[default]
    #[serde(rename = "")]
    Any,
}

impl Display for IoType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
            Self::Any => f.write_str("any"),
        }
    }
}

/// Logical resource bound to a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Data-source name (template-capable)
    pub name: String,

    /// Name of the store this source lives in (a reference, not ownership)
    pub store_name: String,

    /// Path templates by key
    #[serde(default)]
    pub paths: IndexMap<String, String>,

    /// Secondary data-path templates by key (e.g. an array inside a file)
    #[serde(default)]
    pub data_paths: IndexMap<String, String>,
}

impl DataSource {
    /// Create source without any paths
    #[must_use]
    pub fn new(name: impl Into<String>, store_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store_name: store_name.into(),
            paths: IndexMap::new(),
            data_paths: IndexMap::new(),
        }
    }

    /// With a path template
    #[must_use]
    pub fn with_path(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.paths.insert(key.into(), template.into());
        self
    }

    /// With a data-path template
    #[must_use]
    pub fn with_data_path(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.data_paths.insert(key.into(), template.into());
        self
    }

    /// Path template by key
    #[inline]
    #[must_use]
    pub fn path(&self, key: &str) -> Option<&str> {
        self.paths.get(key).map(String::as_str)
    }

    /// Data-path template by key
    #[inline]
    #[must_use]
    pub fn data_path(&self, key: &str) -> Option<&str> {
        self.data_paths.get(key).map(String::as_str)
    }
}

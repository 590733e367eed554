//! Payload, actions and scope nodes
//!
//! The job descriptor decodes into a [`Payload`]: a job-level [`IoManager`]
//! plus an ordered list of [`Action`]s, each carrying its own `IoManager`
//! that augments the job-level one through the scope chain.

use crate::attributes::Attributes;
use crate::error::PayloadError;
use crate::source::{DataSource, IoType};
use crate::store::DataStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One scope node: attributes, stores and data sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IoManager {
    /// Scope attributes (template-capable)
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    /// Stores declared in this scope
    #[serde(default)]
    pub stores: Vec<DataStore>,

    /// Input data sources declared in this scope
    #[serde(default)]
    pub inputs: Vec<DataSource>,

    /// Output data sources declared in this scope
    #[serde(default)]
    pub outputs: Vec<DataSource>,
}

impl IoManager {
    /// Create empty scope node
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With attributes
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// With an additional store
    #[must_use]
    pub fn with_store(mut self, store: DataStore) -> Self {
        self.stores.push(store);
        self
    }

    /// With an additional input
    #[must_use]
    pub fn with_input(mut self, source: DataSource) -> Self {
        self.inputs.push(source);
        self
    }

    /// With an additional output
    #[must_use]
    pub fn with_output(mut self, source: DataSource) -> Self {
        self.outputs.push(source);
        self
    }

    /// Store declared directly in this node
    #[must_use]
    pub fn local_store(&self, name: &str) -> Option<&DataStore> {
        self.stores.iter().find(|s| s.name == name)
    }

    /// Data source declared directly in this node
    ///
    /// [`IoType::Any`] searches inputs before outputs.
    #[must_use]
    pub fn local_data_source(&self, io_type: IoType, name: &str) -> Option<&DataSource> {
        fn find<'a>(set: &'a [DataSource], name: &str) -> Option<&'a DataSource> {
            set.iter().find(|ds| ds.name == name)
        }

        match io_type {
            IoType::Input => find(&self.inputs, name),
            IoType::Output => find(&self.outputs, name),
            IoType::Any => find(&self.inputs, name).or_else(|| find(&self.outputs, name)),
        }
    }
}

/// One named unit of work
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    /// Action-level scope node
    #[serde(flatten)]
    pub io: IoManager,

    /// Free-form action type
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub action_type: String,

    /// Human readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Name matched against the runner registry
    #[serde(default)]
    pub name: String,
}

impl Action {
    /// Create action with an empty scope
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With action scope node
    #[must_use]
    pub fn with_io(mut self, io: IoManager) -> Self {
        self.io = io;
        self
    }

    /// With action type
    #[must_use]
    pub fn with_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = action_type.into();
        self
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Root of the job descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payload {
    /// Job-level scope node
    #[serde(flatten)]
    pub io: IoManager,

    /// Actions in declaration (= execution) order
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Payload {
    /// Create payload from parts
    #[must_use]
    pub fn new(io: IoManager, actions: Vec<Action>) -> Self {
        Self { io, actions }
    }

    /// Decode a JSON descriptor
    ///
    /// # Errors
    /// Returns `PayloadError::Json` on malformed input.
    pub fn from_json_str(s: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Decode a YAML descriptor
    ///
    /// # Errors
    /// Returns `PayloadError::Yaml` on malformed input.
    pub fn from_yaml_str(s: &str) -> Result<Self, PayloadError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Read and decode a descriptor file
    ///
    /// Files ending in `.yaml`/`.yml` decode as YAML; everything else as JSON.
    ///
    /// # Errors
    /// - `PayloadError::Io` if the file cannot be read
    /// - `PayloadError::Json` / `PayloadError::Yaml` on malformed content
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PayloadError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PayloadError::io_error(path, e))?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Encode as pretty JSON
    ///
    /// # Errors
    /// Returns `PayloadError::Json` if a value cannot be encoded.
    pub fn to_json_pretty(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find an action by name
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

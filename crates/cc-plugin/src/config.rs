//! Environment configuration
//!
//! Names of every environment variable the compute environment exposes, and
//! [`EnvConfig`], the `CC_*` subset the plugin manager reads itself.

use crate::error::{PluginError, PluginResult};
use cc_template::Environment;
use std::path::PathBuf;

/// Payload identifier
pub const CC_PAYLOAD_ID: &str = "CC_PAYLOAD_ID";
/// Manifest identifier; names the payload directory under [`CC_ROOT`]
pub const CC_MANIFEST_ID: &str = "CC_MANIFEST_ID";
/// Event identifier
pub const CC_EVENT_IDENTIFIER: &str = "CC_EVENT_IDENTIFIER";
/// Event number
pub const CC_EVENT_NUMBER: &str = "CC_EVENT_NUMBER";
/// Plugin definition
pub const CC_PLUGIN_DEFINITION: &str = "CC_PLUGIN_DEFINITION";
/// Credential profile of the compute environment's own store
pub const CC_PROFILE: &str = "CC";
/// Whether the payload is pretty-printed
pub const CC_PAYLOAD_FORMATTED: &str = "CC_PAYLOAD_FORMATTED";
/// Root path of the compute environment's store
pub const CC_ROOT: &str = "CC_ROOT";
/// Log identifier
pub const CC_LOG: &str = "CC_LOG";

/// Object-store access key
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Object-store secret key
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Object-store region
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
/// Object-store bucket
pub const AWS_S3_BUCKET: &str = "AWS_S3_BUCKET";
/// Use a mock object store
pub const S3_MOCK: &str = "S3_MOCK";
/// Path-style object-store addressing
pub const S3_FORCE_PATH_STYLE: &str = "S3_FORCE_PATH_STYLE";
/// Disable TLS for the object store
pub const S3_DISABLE_SSL: &str = "S3_DISABLE_SSL";
/// Object-store endpoint
pub const AWS_ENDPOINT: &str = "AWS_ENDPOINT";
/// Root of the local filesystem backend
pub const FSB_ROOT_PATH: &str = "FSB_ROOT_PATH";

/// File name of the payload inside the manifest directory
pub const PAYLOAD_FILE: &str = "payload";

/// `CC_*` values captured at initialisation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// [`CC_MANIFEST_ID`]
    pub manifest_id: Option<String>,
    /// [`CC_PAYLOAD_ID`]
    pub payload_id: Option<String>,
    /// [`CC_EVENT_IDENTIFIER`]
    pub event_identifier: Option<String>,
    /// [`CC_EVENT_NUMBER`]
    pub event_number: Option<String>,
    /// [`CC_PLUGIN_DEFINITION`]
    pub plugin_definition: Option<String>,
    /// [`CC_ROOT`]
    pub root: Option<String>,
}

impl EnvConfig {
    /// Read the `CC_*` variables; empty values count as unset
    #[must_use]
    pub fn from_env(env: &dyn Environment) -> Self {
        let get = |name: &str| env.var(name).filter(|v| !v.is_empty());
        Self {
            manifest_id: get(CC_MANIFEST_ID),
            payload_id: get(CC_PAYLOAD_ID),
            event_identifier: get(CC_EVENT_IDENTIFIER),
            event_number: get(CC_EVENT_NUMBER),
            plugin_definition: get(CC_PLUGIN_DEFINITION),
            root: get(CC_ROOT),
        }
    }

    /// Location of the payload: `{CC_ROOT}/{CC_MANIFEST_ID}/payload`
    ///
    /// # Errors
    /// Returns `PluginError::Config` if either variable is unset.
    pub fn payload_path(&self) -> PluginResult<PathBuf> {
        let root = self
            .root
            .as_deref()
            .ok_or_else(|| PluginError::config(format!("{CC_ROOT} is not set")))?;
        let manifest = self
            .manifest_id
            .as_deref()
            .ok_or_else(|| PluginError::config(format!("{CC_MANIFEST_ID} is not set")))?;
        Ok(PathBuf::from(root).join(manifest).join(PAYLOAD_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn reads_cc_variables() {
        let config = EnvConfig::from_env(&env(&[
            (CC_MANIFEST_ID, "m-1"),
            (CC_EVENT_NUMBER, "12"),
            (CC_EVENT_IDENTIFIER, ""),
        ]));

        assert_eq!(config.manifest_id.as_deref(), Some("m-1"));
        assert_eq!(config.event_number.as_deref(), Some("12"));
        assert_eq!(config.event_identifier, None);
    }

    #[test]
    fn payload_path_joins_root_and_manifest() {
        let config = EnvConfig::from_env(&env(&[(CC_ROOT, "/cc_store"), (CC_MANIFEST_ID, "m-1")]));
        assert_eq!(config.payload_path().unwrap(), PathBuf::from("/cc_store/m-1/payload"));
    }

    #[test]
    fn payload_path_requires_both() {
        let config = EnvConfig::from_env(&env(&[(CC_ROOT, "/cc_store")]));
        let err = config.payload_path().unwrap_err();
        assert!(err.to_string().contains(CC_MANIFEST_ID));
    }
}

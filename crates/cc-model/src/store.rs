//! Data stores
//!
//! Provides [`DataStore`], a named and typed backing resource plus the live
//! [`Session`] bound to it during the connect phase.

use crate::attributes::Attributes;
use crate::capability::Session;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Named backing store declared in a scope
///
/// The session cell is written exactly once, by the connect phase; stores
/// whose type has no connect capability keep an empty cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataStore {
    /// Store name, unique within the declaring scope
    pub name: String,

    /// Store-type identifier looked up in the store registry
    pub store_type: String,

    /// Credential profile used by backends to pick environment variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Backend connection parameters
    #[serde(default)]
    pub params: Attributes,

    #[serde(skip)]
    session: OnceCell<Arc<dyn Session>>,
}

impl DataStore {
    /// Create store with no parameters
    #[must_use]
    pub fn new(name: impl Into<String>, store_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store_type: store_type.into(),
            profile: None,
            params: Attributes::new(),
            session: OnceCell::new(),
        }
    }

    /// With connection parameters
    #[inline]
    #[must_use]
    pub fn with_params(mut self, params: Attributes) -> Self {
        self.params = params;
        self
    }

    /// With credential profile
    #[inline]
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Bound session, if any
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&Arc<dyn Session>> {
        self.session.get()
    }

    /// Check if a session has been bound
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.get().is_some()
    }

    /// Bind the session
    ///
    /// # Errors
    /// Returns the rejected session if one is already bound.
    pub fn bind_session(&self, session: Arc<dyn Session>) -> Result<(), Arc<dyn Session>> {
        self.session.set(session)
    }

    /// Root parameter used for absolute path resolution (default `/`)
    #[inline]
    #[must_use]
    pub fn root(&self) -> String {
        self.params.get_string_or_default("root", "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    #[derive(Debug)]
    struct Dummy;

    impl Session for Dummy {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn session_binds_once() {
        let store = DataStore::new("FFRD", "FS");
        assert!(!store.is_connected());

        assert!(store.bind_session(Arc::new(Dummy)).is_ok());
        assert!(store.is_connected());
        assert!(store.bind_session(Arc::new(Dummy)).is_err());
    }

    #[test]
    fn root_defaults_to_slash() {
        let store = DataStore::new("s", "FS");
        assert_eq!(store.root(), "/");

        let store = store.with_params(Attributes::new().with("root", "/model"));
        assert_eq!(store.root(), "/model");
    }

    #[test]
    fn deserialize_store() {
        let store: DataStore = serde_json::from_str(
            r#"{"name": "FFRD", "store_type": "S3", "profile": "FFRD", "params": {"root": "/sims"}}"#,
        )
        .unwrap();

        assert_eq!(store.name, "FFRD");
        assert_eq!(store.store_type, "S3");
        assert_eq!(store.profile.as_deref(), Some("FFRD"));
        assert_eq!(store.root(), "/sims");
        assert!(!store.is_connected());
    }
}
